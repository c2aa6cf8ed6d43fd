//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, ChunkRecord, IndexedCourse, QueryFilter, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<String, ChunkRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, record: &ChunkRecord) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn upsert_batch(&self, batch: &[ChunkRecord]) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        for record in batch {
            records.insert(record.id.clone(), record.clone());
        }
        Ok(batch.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        filter: Option<&QueryFilter>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let records = self.records.read().unwrap();

        let mut results: Vec<SearchResult> = records
            .values()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.meta)))
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                SearchResult {
                    record: record.clone(),
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn clear(&self) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        let count = records.len();
        records.clear();
        Ok(count)
    }

    async fn list_courses(&self) -> Result<Vec<IndexedCourse>> {
        let records = self.records.read().unwrap();

        let mut course_map: HashMap<String, IndexedCourse> = HashMap::new();

        for record in records.values() {
            let entry = course_map
                .entry(record.meta.course_code.clone())
                .or_insert_with(|| IndexedCourse {
                    course_code: record.meta.course_code.clone(),
                    course_name: record.meta.course_name.clone(),
                    chunk_count: 0,
                    indexed_at: record.meta.ingested_at,
                });

            entry.chunk_count += 1;
            if record.meta.ingested_at > entry.indexed_at {
                entry.indexed_at = record.meta.ingested_at;
            }
        }

        let mut courses: Vec<IndexedCourse> = course_map.into_values().collect();
        courses.sort_by(|a, b| a.course_code.cmp(&b.course_code));

        Ok(courses)
    }

    async fn get_by_course_code(&self, course_code: &str) -> Result<Vec<ChunkRecord>> {
        let code = course_code.to_uppercase();
        let records = self.records.read().unwrap();
        let mut result: Vec<ChunkRecord> = records
            .values()
            .filter(|r| r.meta.course_code == code)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    async fn point_count(&self) -> Result<usize> {
        let records = self.records.read().unwrap();
        Ok(records.len())
    }
}
