//! Course chunking: the atomic indexed units and how they are produced.
//!
//! A course record is split into one chunk per substantial field, one
//! aggregate learning-outcomes chunk, and one synthetic course-info summary
//! chunk. Chunk ids are deterministic so re-ingestion overwrites in place.

mod fields;
mod identity;
mod junk;

pub use fields::FieldChunker;
pub use identity::make_chunk_id;
pub use junk::is_junk;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content a chunk carries. One variant per chunkable field, plus
/// the aggregate learning-outcomes chunk and the synthetic summary chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Overview,
    AdmissionRequirements,
    CareerOptions,
    CourseStructure,
    ProfessionalRecognition,
    InherentRequirements,
    StructureNotes,
    Notes,
    LearningOutcomes,
    CourseInfo,
}

impl ChunkType {
    /// Stable snake_case name, used in chunk-id derivation and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Overview => "overview",
            ChunkType::AdmissionRequirements => "admission_requirements",
            ChunkType::CareerOptions => "career_options",
            ChunkType::CourseStructure => "course_structure",
            ChunkType::ProfessionalRecognition => "professional_recognition",
            ChunkType::InherentRequirements => "inherent_requirements",
            ChunkType::StructureNotes => "structure_notes",
            ChunkType::Notes => "notes",
            ChunkType::LearningOutcomes => "learning_outcomes",
            ChunkType::CourseInfo => "course_info",
        }
    }

    /// Human-readable section label, used as the chunk text prefix and in
    /// citation headers.
    pub fn label(&self) -> &'static str {
        match self {
            ChunkType::Overview => "Overview",
            ChunkType::AdmissionRequirements => "Admission Requirements",
            ChunkType::CareerOptions => "Career Options",
            ChunkType::CourseStructure => "Course Structure",
            ChunkType::ProfessionalRecognition => "Professional Recognition",
            ChunkType::InherentRequirements => "Inherent Requirements",
            ChunkType::StructureNotes => "Structure Notes",
            ChunkType::Notes => "Notes",
            ChunkType::LearningOutcomes => "Learning Outcomes",
            ChunkType::CourseInfo => "Course Information",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata stored alongside every chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Resolved course code (uppercased; "UNKNOWN" when unresolvable).
    pub course_code: String,
    /// Course display name.
    pub course_name: String,
    /// Kind of content this chunk carries.
    pub chunk_type: ChunkType,
    /// Display label for citations.
    pub chunk_label: String,
    /// URL the source record was crawled from.
    pub source_url: String,
    /// When this chunk was produced.
    pub ingested_at: DateTime<Utc>,
}

/// The atomic indexed unit: a stable id, label-prefixed text, and metadata.
///
/// Serializes to the one-object-per-line JSONL exchange format:
/// `{"id": ..., "text": ..., "meta": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub meta: ChunkMeta,
}
