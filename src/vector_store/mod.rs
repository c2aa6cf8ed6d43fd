//! Vector collection abstraction for Coursebook.
//!
//! Provides a trait-based interface for different vector database backends.
//! Points are keyed by the chunk id string, carry the chunk metadata plus
//! text as payload, and are ranked by cosine similarity.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::{Chunk, ChunkMeta};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk stored in the vector collection: payload plus embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable chunk id (also the point key).
    pub id: String,
    /// Label-prefixed chunk text.
    pub text: String,
    /// Chunk metadata.
    pub meta: ChunkMeta,
    /// L2-normalized embedding vector.
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            text: chunk.text,
            meta: chunk.meta,
            embedding,
        }
    }
}

/// A search result with score, ordered descending by score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub record: ChunkRecord,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Optional metadata filter applied during search.
///
/// Course codes match exactly after uppercasing; course names match as a
/// case-insensitive substring. When both are present they combine with AND;
/// when both are absent retrieval is unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
}

impl QueryFilter {
    /// Filter by exact course code (case-normalized upper).
    pub fn by_course_code(code: &str) -> Self {
        Self {
            course_code: Some(code.to_uppercase()),
            course_name: None,
        }
    }

    /// Filter by partial course name.
    pub fn by_course_name(name: &str) -> Self {
        Self {
            course_code: None,
            course_name: Some(name.to_string()),
        }
    }

    /// Normalized course code, if any.
    pub fn normalized_code(&self) -> Option<String> {
        self.course_code.as_deref().map(str::to_uppercase)
    }

    /// True when no condition is set.
    pub fn is_empty(&self) -> bool {
        self.course_code.is_none() && self.course_name.is_none()
    }

    /// Evaluate the filter against chunk metadata.
    pub fn matches(&self, meta: &ChunkMeta) -> bool {
        if let Some(code) = self.normalized_code() {
            if meta.course_code != code {
                return false;
            }
        }
        if let Some(name) = &self.course_name {
            if !meta
                .course_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Summary information about an indexed course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedCourse {
    /// Course code.
    pub course_code: String,
    /// Course name.
    pub course_name: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// When the course was last indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
///
/// The collection has a single batch writer; query-time readers run against
/// it without extra locking because index writes are offline operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a chunk record, overwriting any existing point with the same id.
    async fn upsert(&self, record: &ChunkRecord) -> Result<()>;

    /// Bulk upsert chunk records.
    async fn upsert_batch(&self, records: &[ChunkRecord]) -> Result<usize>;

    /// Search for similar chunks, optionally constrained by a metadata filter.
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: Option<&QueryFilter>,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Remove every point from the collection (rebuild support).
    async fn clear(&self) -> Result<usize>;

    /// List all indexed courses.
    async fn list_courses(&self) -> Result<Vec<IndexedCourse>>;

    /// Get all chunks for a course code.
    async fn get_by_course_code(&self, course_code: &str) -> Result<Vec<ChunkRecord>>;

    /// Get total point count.
    async fn point_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
