//! Context assembly for answer generation.

use crate::vector_store::SearchResult;

/// Default character budget for an assembled context block.
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// Assemble retrieved chunks into a single context string.
///
/// Hits are taken greedily in the given (descending score) order. The budget
/// counts chunk text only; citation headers ride free so that changing the
/// header format never changes which chunks are included. A chunk whose text
/// would push the running total past `max_chars` is skipped, but later
/// smaller chunks may still fit.
pub fn build_context(hits: &[SearchResult], max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(hits.len());
    let mut used = 0usize;

    for hit in hits {
        let text = hit.record.text.as_str();
        if used + text.len() > max_chars {
            continue;
        }
        used += text.len();

        let meta = &hit.record.meta;
        let mut cite_parts: Vec<String> = Vec::with_capacity(3);
        if !meta.course_code.is_empty() {
            cite_parts.push(format!("Course Code: {}", meta.course_code));
        }
        if !meta.course_name.is_empty() {
            cite_parts.push(format!("({})", meta.course_name));
        }
        if !meta.chunk_label.is_empty() {
            cite_parts.push(format!("- {}", meta.chunk_label));
        }

        let mut cite = cite_parts.join(" | ");
        if !meta.source_url.is_empty() {
            cite.push_str(&format!("\nSource: {}", meta.source_url));
        }

        parts.push(format!("[{}]\n{}", cite, text));
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::record;
    use crate::vector_store::SearchResult;

    fn hit_with_text(id: &str, course_code: &str, text: &str, score: f32) -> SearchResult {
        let mut rec = record(id, course_code, "Bachelor of Testing", vec![1.0]);
        rec.text = text.to_string();
        SearchResult { record: rec, score }
    }

    #[test]
    fn test_citation_header_format() {
        let mut rec = record("a", "C10302", "Bachelor of Sport", vec![1.0]);
        rec.text = "Overview:\nSport content.".to_string();
        rec.meta.source_url = "https://handbook.example.edu/c10302".to_string();
        let context = build_context(&[SearchResult { record: rec, score: 0.9 }], 4000);

        assert!(context.starts_with(
            "[Course Code: C10302 | (Bachelor of Sport) | - Overview\nSource: https://handbook.example.edu/c10302]\n"
        ));
        assert!(context.ends_with("Overview:\nSport content."));
    }

    #[test]
    fn test_missing_fields_are_omitted_from_citation() {
        let mut rec = record("a", "", "", vec![1.0]);
        rec.meta.course_code = String::new();
        rec.meta.course_name = String::new();
        rec.meta.chunk_label = "Overview".to_string();
        rec.text = "body".to_string();
        let context = build_context(&[SearchResult { record: rec, score: 0.5 }], 4000);

        assert_eq!(context, "[- Overview]\nbody");
    }

    #[test]
    fn test_budget_counts_text_only() {
        // Two chunks of 30 chars each fit a 60-char budget even though the
        // headers alone exceed it.
        let a = hit_with_text("a", "C10302", &"x".repeat(30), 0.9);
        let b = hit_with_text("b", "C20060", &"y".repeat(30), 0.8);
        let context = build_context(&[a, b], 60);

        assert!(context.contains(&"x".repeat(30)));
        assert!(context.contains(&"y".repeat(30)));
    }

    #[test]
    fn test_oversized_chunk_is_skipped_but_later_ones_fit() {
        let a = hit_with_text("a", "C10302", &"a".repeat(50), 0.9);
        let b = hit_with_text("b", "C20060", &"b".repeat(100), 0.8);
        let c = hit_with_text("c", "C30010", &"c".repeat(40), 0.7);
        let context = build_context(&[a, b, c], 100);

        assert!(context.contains(&"a".repeat(50)));
        assert!(!context.contains(&"b".repeat(100)));
        assert!(context.contains(&"c".repeat(40)));
    }

    #[test]
    fn test_exact_budget_fit_is_included() {
        let a = hit_with_text("a", "C10302", &"a".repeat(60), 0.9);
        let b = hit_with_text("b", "C20060", &"b".repeat(40), 0.8);
        let c = hit_with_text("c", "C30010", &"c".repeat(1), 0.7);
        let context = build_context(&[a, b, c], 100);

        assert!(context.contains(&"a".repeat(60)));
        assert!(context.contains(&"b".repeat(40)));
        assert!(!context.contains("[Course Code: C30010"));
    }

    #[test]
    fn test_empty_hits_give_empty_context() {
        assert_eq!(build_context(&[], 4000), "");
    }
}
