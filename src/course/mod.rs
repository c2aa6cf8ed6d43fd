//! Course record model.
//!
//! Course records come from an external crawler/CSV merge step and are
//! treated as untrusted input: every field is optional and validated at the
//! point of use rather than assumed well-formed.

pub mod code;

pub use code::{extract_course_code, find_course_code, resolve_course_code, COURSE_CODE_PATTERN};

use serde::{Deserialize, Serialize};

/// A single numbered learning outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningOutcome {
    /// Outcome number as shown in the handbook.
    #[serde(default)]
    pub number: Option<u32>,
    /// Outcome text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Source metadata attached to a course record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseMetadata {
    /// URL the record was crawled from.
    #[serde(default)]
    pub source_url: Option<String>,
}

/// A semi-structured course record as produced by the crawler.
///
/// Read-only to the chunking pipeline. Field presence varies per course;
/// `course_structure` in particular arrives either as flat text or as a
/// structure mapping depending on the page layout, so it is kept as a raw
/// JSON value and flattened during chunking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseRecord {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub credit_points: Option<String>,
    pub cricos_code: Option<String>,
    pub overview: Option<String>,
    pub admission_requirements: Option<String>,
    pub career_options: Option<String>,
    pub course_structure: Option<serde_json::Value>,
    pub professional_recognition: Option<String>,
    pub inherent_requirements: Option<String>,
    pub structure_notes: Option<String>,
    pub notes: Option<String>,
    pub learning_outcomes: Vec<LearningOutcome>,
    pub awards: Vec<String>,
    pub faculty: Vec<String>,
    pub location: Vec<String>,
    pub study_level: Option<String>,
    pub duration_fulltime: Option<String>,
    pub duration_parttime: Option<String>,
    pub metadata: CourseMetadata,
}

impl CourseRecord {
    /// Source URL for this record, if the crawler captured one.
    pub fn source_url(&self) -> &str {
        self.metadata.source_url.as_deref().unwrap_or("")
    }
}

/// Returns `Some(trimmed)` when a string field carries usable content.
///
/// The crawler emits the literal string "None" for absent sections.
pub fn usable_text(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed == "None" {
        None
    } else {
        Some(trimmed)
    }
}
