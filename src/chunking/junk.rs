//! Junk filtering applied at index-build time.
//!
//! The field chunker already enforces its own minimum length, but chunk
//! JSONL files can come from other ingestion paths too, so indexing runs
//! this second-pass screen over every row.

use regex::Regex;
use std::sync::OnceLock;

/// Minimum text length, in characters, accepted at index-build time.
const MIN_TEXT_LEN: usize = 40;

fn blank_page_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*this page has been left intentionally blank\.?\s*$")
            .expect("valid regex")
    })
}

fn page_footer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*page\s*\w*\s*\d+\s*(of|/)\s*\w*\s*\d+\s*$").expect("valid regex")
    })
}

/// Returns true for text not worth indexing: empty or near-empty strings,
/// boilerplate blank-page markers, page footers, and text that is mostly
/// digits (numeric tables are useless for semantic retrieval).
pub fn is_junk(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return true;
    }
    let char_len = t.chars().count();
    if char_len < MIN_TEXT_LEN {
        return true;
    }
    if blank_page_re().is_match(t) {
        return true;
    }
    if page_footer_re().is_match(t) {
        return true;
    }
    let digits = t.chars().filter(|c| c.is_ascii_digit()).count();
    if digits * 2 > char_len {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_short() {
        assert!(is_junk(""));
        assert!(is_junk("   \n "));
        assert!(is_junk("too short to be a useful retrieval unit"));
    }

    #[test]
    fn test_rejects_boilerplate() {
        assert!(is_junk("This page has been left intentionally blank."));
        assert!(is_junk("  this page has been left intentionally blank  "));
    }

    #[test]
    fn test_rejects_page_footers() {
        assert!(is_junk("Page 3 of 12"));
        assert!(is_junk("page A 3 / B 12"));
    }

    #[test]
    fn test_rejects_mostly_numeric() {
        let table = "123456 789012 345678 901234 567890 123456 789012 x";
        assert!(is_junk(table));
    }

    #[test]
    fn test_thresholds_count_chars_not_bytes() {
        // 25 digits + 24 accented chars: 49 chars but 73 bytes. The digit
        // share clears 50% only when the denominator counts characters.
        let mixed = format!("{}{}", "7".repeat(25), "é".repeat(24));
        assert!(is_junk(&mixed));

        let accented = "Aperçu général du cours, déroulé et débouchés métiers.";
        assert!(!is_junk(accented));
    }

    #[test]
    fn test_accepts_prose() {
        let text = "Overview:\nThis course develops core skills in exercise science, \
                    covering physiology, biomechanics and motor control.";
        assert!(!is_junk(text));
    }
}
