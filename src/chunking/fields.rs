//! Field chunking: split a course record into retrieval-sized chunks.

use crate::chunking::{make_chunk_id, Chunk, ChunkMeta, ChunkType};
use crate::course::{resolve_course_code, usable_text, CourseRecord, LearningOutcome};
use chrono::Utc;
use tracing::debug;

/// Minimum formatted length, in characters, for a field to stand alone as a
/// chunk.
/// Shorter field values are not independently useful retrieval units; they
/// are still picked up by the synthetic course-info chunk.
const MIN_FIELD_LEN: usize = 50;

/// Crawler artifact that sometimes ends up in the course-name field.
const BOGUS_COURSE_NAME: &str = "TEQSA Category: Australian University";

/// One row of the chunkable-field table: which field, and how to flatten it.
struct FieldSpec {
    chunk_type: ChunkType,
    extract: fn(&CourseRecord) -> Option<String>,
}

/// Chunkable scalar/text fields in fixed emission order.
const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        chunk_type: ChunkType::Overview,
        extract: |r| usable_text(r.overview.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::AdmissionRequirements,
        extract: |r| usable_text(r.admission_requirements.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::CareerOptions,
        extract: |r| usable_text(r.career_options.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::CourseStructure,
        extract: |r| r.course_structure.as_ref().and_then(format_value),
    },
    FieldSpec {
        chunk_type: ChunkType::ProfessionalRecognition,
        extract: |r| usable_text(r.professional_recognition.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::InherentRequirements,
        extract: |r| usable_text(r.inherent_requirements.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::StructureNotes,
        extract: |r| usable_text(r.structure_notes.as_deref()).map(str::to_string),
    },
    FieldSpec {
        chunk_type: ChunkType::Notes,
        extract: |r| usable_text(r.notes.as_deref()).map(str::to_string),
    },
];

/// Flatten a free JSON field value into display text.
///
/// Strings pass through, lists of scalars are comma-joined, and mappings are
/// serialized to canonical JSON text.
fn format_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => usable_text(Some(s)).map(str::to_string),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => usable_text(Some(s)).map(str::to_string),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        serde_json::Value::Object(map) if map.is_empty() => None,
        serde_json::Value::Object(_) => serde_json::to_string(value).ok(),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Join learning outcomes into numbered lines, skipping entries without text.
fn format_outcomes(outcomes: &[LearningOutcome]) -> Option<String> {
    let lines: Vec<String> = outcomes
        .iter()
        .filter_map(|o| {
            let text = usable_text(o.text.as_deref())?;
            let number = o.number.map(|n| n.to_string()).unwrap_or_default();
            Some(format!("{}. {}", number, text))
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Recover a display name from the filename stem when the record's name
/// field is missing or carries a known crawler artifact.
fn course_name_from_token(token: &str) -> Option<String> {
    let parts: Vec<&str> = token
        .split('_')
        .filter(|p| {
            !p.is_empty() && *p != "None" && crate::course::extract_course_code(p).is_none()
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Splits course records into ordered chunk sequences.
///
/// Chunking is a pure function of the record and uniqueness token: running
/// it twice over unchanged input yields identical id sequences and text.
#[derive(Debug, Default)]
pub struct FieldChunker;

impl FieldChunker {
    pub fn new() -> Self {
        Self
    }

    /// Chunk one course record. The uniqueness token (source filename stem)
    /// disambiguates chunk ids when course codes collide across files.
    pub fn chunk(&self, record: &CourseRecord, uniqueness_token: &str) -> Vec<Chunk> {
        let course_code = resolve_course_code(record, uniqueness_token);
        let course_name = self.resolve_course_name(record, uniqueness_token);
        let source_url = record.source_url().to_string();
        let ingested_at = Utc::now();

        let meta_for = |chunk_type: ChunkType| ChunkMeta {
            course_code: course_code.clone(),
            course_name: course_name.clone(),
            chunk_type,
            chunk_label: chunk_type.label().to_string(),
            source_url: source_url.clone(),
            ingested_at,
        };

        let mut chunks = Vec::new();
        let mut ordinal = 0usize;

        // Ordinal increments only for chunks actually emitted.
        for spec in FIELDS {
            let Some(text) = (spec.extract)(record) else {
                continue;
            };
            let text = text.trim().to_string();
            let char_len = text.chars().count();
            if char_len < MIN_FIELD_LEN {
                debug!(
                    course_code = %course_code,
                    chunk_type = %spec.chunk_type,
                    len = char_len,
                    "skipping short field"
                );
                continue;
            }

            let id = make_chunk_id(&course_code, spec.chunk_type, ordinal, uniqueness_token);
            ordinal += 1;
            chunks.push(Chunk {
                id,
                text: format!("{}:\n{}", spec.chunk_type.label(), text),
                meta: meta_for(spec.chunk_type),
            });
        }

        // Learning outcomes aggregate into a single chunk.
        if let Some(outcomes_text) = format_outcomes(&record.learning_outcomes) {
            let id = make_chunk_id(
                &course_code,
                ChunkType::LearningOutcomes,
                ordinal,
                uniqueness_token,
            );
            ordinal += 1;
            chunks.push(Chunk {
                id,
                text: format!("Learning Outcomes:\n{}", outcomes_text),
                meta: meta_for(ChunkType::LearningOutcomes),
            });
        }

        // Synthetic summary chunk: short metadata fields are individually
        // below the retrieval threshold but jointly answer "what is course X".
        if let Some(info_text) = self.course_info_text(record, &course_code, &course_name) {
            let id = make_chunk_id(&course_code, ChunkType::CourseInfo, ordinal, uniqueness_token);
            chunks.push(Chunk {
                id,
                text: info_text,
                meta: meta_for(ChunkType::CourseInfo),
            });
        }

        debug!(
            course_code = %course_code,
            chunks = chunks.len(),
            "chunked course record"
        );
        chunks
    }

    fn resolve_course_name(&self, record: &CourseRecord, uniqueness_token: &str) -> String {
        match usable_text(record.course_name.as_deref()) {
            Some(name) if name != BOGUS_COURSE_NAME => name.to_string(),
            _ => course_name_from_token(uniqueness_token).unwrap_or_default(),
        }
    }

    fn course_info_text(
        &self,
        record: &CourseRecord,
        course_code: &str,
        course_name: &str,
    ) -> Option<String> {
        let mut parts = Vec::new();

        if !course_name.is_empty() {
            parts.push(format!("Course Name: {}", course_name));
        }
        if !course_code.is_empty() {
            parts.push(format!("Course Code: {}", course_code));
        }
        if let Some(points) = usable_text(record.credit_points.as_deref()) {
            parts.push(format!("Credit Points: {}", points));
        }
        if let Some(cricos) = usable_text(record.cricos_code.as_deref()) {
            parts.push(format!("CRICOS Code: {}", cricos));
        }
        if !record.faculty.is_empty() {
            parts.push(format!("Faculty: {}", record.faculty.join(", ")));
        }
        if let Some(level) = usable_text(record.study_level.as_deref()) {
            parts.push(format!("Study Level: {}", level));
        }
        if let Some(duration) = usable_text(record.duration_fulltime.as_deref()) {
            parts.push(format!("Duration (Full-time): {}", duration));
        }
        if let Some(duration) = usable_text(record.duration_parttime.as_deref()) {
            parts.push(format!("Duration (Part-time): {}", duration));
        }
        if !record.location.is_empty() {
            parts.push(format!("Location: {}", record.location.join(", ")));
        }
        if !record.awards.is_empty() {
            parts.push(format!("Awards: {}", record.awards.join(", ")));
        }
        if let Some(overview) = usable_text(record.overview.as_deref()) {
            parts.push(format!("\nOverview:\n{}", overview));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseMetadata;

    fn sample_record() -> CourseRecord {
        CourseRecord {
            course_code: Some("C10302".to_string()),
            course_name: Some("Bachelor of Sport and Exercise Science".to_string()),
            credit_points: Some("144".to_string()),
            overview: Some(
                "This course develops core skills in exercise science, covering \
                 physiology, biomechanics, motor control and exercise prescription."
                    .to_string(),
            ),
            admission_requirements: Some(
                "Applicants must have completed an Australian Year 12 qualification \
                 or equivalent, with assumed knowledge in mathematics and science."
                    .to_string(),
            ),
            learning_outcomes: vec![
                LearningOutcome {
                    number: Some(1),
                    text: Some("Apply scientific principles to exercise.".to_string()),
                },
                LearningOutcome {
                    number: Some(2),
                    text: Some("Communicate with diverse communities.".to_string()),
                },
            ],
            metadata: CourseMetadata {
                source_url: Some(
                    "https://handbook.example.edu/courses/c10302.html".to_string(),
                ),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = FieldChunker::new();
        let record = sample_record();

        let first = chunker.chunk(&record, "course_C10302");
        let second = chunker.chunk(&record, "course_C10302");

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_uniqueness_token_discriminates_shared_codes() {
        let chunker = FieldChunker::new();
        let record = sample_record();

        let a = chunker.chunk(&record, "file_a");
        let b = chunker.chunk(&record, "file_b");

        let mut ids: Vec<&str> = a.iter().chain(b.iter()).map(|c| c.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total, "ids must be pairwise distinct across files");
    }

    #[test]
    fn test_field_length_boundary() {
        let chunker = FieldChunker::new();

        let mut record = CourseRecord {
            notes: Some("x".repeat(49)),
            ..Default::default()
        };
        let chunks = chunker.chunk(&record, "file_C10302");
        assert!(
            !chunks.iter().any(|c| c.meta.chunk_type == ChunkType::Notes),
            "49-character field must be dropped"
        );

        record.notes = Some("x".repeat(50));
        let chunks = chunker.chunk(&record, "file_C10302");
        assert!(
            chunks.iter().any(|c| c.meta.chunk_type == ChunkType::Notes),
            "50-character field must be retained"
        );
    }

    #[test]
    fn test_field_length_counts_chars_not_bytes() {
        let chunker = FieldChunker::new();

        // 49 chars but 98 bytes; the threshold is a character count.
        let mut record = CourseRecord {
            notes: Some("é".repeat(49)),
            ..Default::default()
        };
        let chunks = chunker.chunk(&record, "file_C10302");
        assert!(!chunks.iter().any(|c| c.meta.chunk_type == ChunkType::Notes));

        record.notes = Some("é".repeat(50));
        let chunks = chunker.chunk(&record, "file_C10302");
        assert!(chunks.iter().any(|c| c.meta.chunk_type == ChunkType::Notes));
    }

    #[test]
    fn test_skips_none_and_empty_fields() {
        let chunker = FieldChunker::new();
        let record = CourseRecord {
            overview: Some("None".to_string()),
            notes: Some("   ".to_string()),
            ..Default::default()
        };

        let chunks = chunker.chunk(&record, "file_C10302");
        assert!(!chunks
            .iter()
            .any(|c| matches!(c.meta.chunk_type, ChunkType::Overview | ChunkType::Notes)));
    }

    #[test]
    fn test_ordinals_skip_only_emitted_chunks() {
        let chunker = FieldChunker::new();
        let record = sample_record();
        let chunks = chunker.chunk(&record, "file_a");

        // overview, admission_requirements, learning_outcomes, course_info
        assert_eq!(chunks.len(), 4);
        let expected = [
            make_chunk_id("C10302", ChunkType::Overview, 0, "file_a"),
            make_chunk_id("C10302", ChunkType::AdmissionRequirements, 1, "file_a"),
            make_chunk_id("C10302", ChunkType::LearningOutcomes, 2, "file_a"),
            make_chunk_id("C10302", ChunkType::CourseInfo, 3, "file_a"),
        ];
        let got: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(got, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_learning_outcomes_aggregate() {
        let chunker = FieldChunker::new();
        let record = sample_record();
        let chunks = chunker.chunk(&record, "file_a");

        let outcomes = chunks
            .iter()
            .find(|c| c.meta.chunk_type == ChunkType::LearningOutcomes)
            .expect("learning outcomes chunk");
        assert!(outcomes.text.starts_with("Learning Outcomes:\n"));
        assert!(outcomes.text.contains("1. Apply scientific principles"));
        assert!(outcomes.text.contains("2. Communicate with diverse"));
    }

    #[test]
    fn test_course_info_chunk_is_last_and_joint() {
        let chunker = FieldChunker::new();
        let record = sample_record();
        let chunks = chunker.chunk(&record, "file_a");

        let info = chunks.last().expect("chunks");
        assert_eq!(info.meta.chunk_type, ChunkType::CourseInfo);
        assert!(info.text.contains("Course Name: Bachelor of Sport"));
        assert!(info.text.contains("Course Code: C10302"));
        assert!(info.text.contains("Credit Points: 144"));
        assert!(info.text.contains("Overview:"));
    }

    #[test]
    fn test_structure_mapping_is_serialized() {
        let chunker = FieldChunker::new();
        let structure = serde_json::json!({
            "core": ["Exercise Physiology", "Biomechanics", "Motor Control and Learning"],
            "electives": ["Sports Nutrition", "Strength and Conditioning"]
        });
        let record = CourseRecord {
            course_structure: Some(structure),
            ..Default::default()
        };

        let chunks = chunker.chunk(&record, "file_C10302");
        let structure_chunk = chunks
            .iter()
            .find(|c| c.meta.chunk_type == ChunkType::CourseStructure)
            .expect("structure chunk");
        assert!(structure_chunk.text.starts_with("Course Structure:\n"));
        assert!(structure_chunk.text.contains("Exercise Physiology"));
    }

    #[test]
    fn test_bogus_course_name_recovered_from_token() {
        let chunker = FieldChunker::new();
        let record = CourseRecord {
            course_name: Some(BOGUS_COURSE_NAME.to_string()),
            overview: Some("A".repeat(60)),
            ..Default::default()
        };

        let chunks = chunker.chunk(&record, "Bachelor_of_Science_C10123_None");
        assert_eq!(chunks[0].meta.course_name, "Bachelor of Science");
        assert_eq!(chunks[0].meta.course_code, "C10123");
    }
}
