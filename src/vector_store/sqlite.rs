//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! Metadata filters are pushed down into SQL; similarity ranking happens
//! over the filtered rows. For large datasets consider a dedicated vector
//! database behind the same trait.

use super::{cosine_similarity, ChunkRecord, IndexedCourse, QueryFilter, SearchResult, VectorStore};
use crate::chunking::{ChunkMeta, ChunkType};
use crate::error::{CoursebookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_code TEXT NOT NULL,
        course_name TEXT NOT NULL,
        chunk_type TEXT NOT NULL,
        chunk_label TEXT NOT NULL,
        source_url TEXT NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        ingested_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course_code ON chunks(course_code);
    CREATE INDEX IF NOT EXISTS idx_chunks_course_name ON chunks(course_name);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CoursebookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ChunkRecord> {
        let chunk_type_str: String = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(7)?;
        let ingested_at_str: String = row.get(8)?;

        let chunk_type: ChunkType =
            serde_json::from_value(serde_json::Value::String(chunk_type_str))
                .unwrap_or(ChunkType::CourseInfo);

        Ok(ChunkRecord {
            id: row.get(0)?,
            text: row.get(6)?,
            meta: ChunkMeta {
                course_code: row.get(1)?,
                course_name: row.get(2)?,
                chunk_type,
                chunk_label: row.get(4)?,
                source_url: row.get(5)?,
                ingested_at: DateTime::parse_from_rfc3339(&ingested_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            },
            embedding: Self::bytes_to_embedding(&embedding_bytes),
        })
    }

    fn insert_record(conn: &Connection, record: &ChunkRecord) -> Result<()> {
        let chunk_type = record.meta.chunk_type.as_str();
        let embedding_bytes = Self::embedding_to_bytes(&record.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO chunks
            (id, course_code, course_name, chunk_type, chunk_label, source_url,
             text, embedding, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.meta.course_code,
                record.meta.course_name,
                chunk_type,
                record.meta.chunk_label,
                record.meta.source_url,
                record.text,
                embedding_bytes,
                record.meta.ingested_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, record))]
    async fn upsert(&self, record: &ChunkRecord) -> Result<()> {
        let conn = self.lock()?;
        Self::insert_record(&conn, record)?;
        debug!("Upserted chunk {}", record.id);
        Ok(())
    }

    #[instrument(skip(self, records))]
    async fn upsert_batch(&self, records: &[ChunkRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for record in records {
            Self::insert_record(&tx, record)?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self, query_embedding, filter))]
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: Option<&QueryFilter>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut sql = String::from(
            r#"
            SELECT id, course_code, course_name, chunk_type, chunk_label,
                   source_url, text, embedding, ingested_at
            FROM chunks
            "#,
        );
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(f) = filter {
            if let Some(code) = f.normalized_code() {
                conditions.push("course_code = ?");
                values.push(code);
            }
            if let Some(name) = &f.course_name {
                conditions.push("course_name LIKE '%' || ? || '%'");
                values.push(name.clone());
            }
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_record)?;

        let mut results: Vec<SearchResult> = rows
            .filter_map(|r| r.ok())
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                SearchResult { record, score }
            })
            .collect();

        // Sort by score descending; ties keep the store's natural order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM chunks", [])?;
        info!("Cleared {} chunks from collection", deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<IndexedCourse>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT course_code, course_name, COUNT(*) as chunk_count,
                   MAX(ingested_at) as indexed_at
            FROM chunks
            GROUP BY course_code
            ORDER BY course_code
            "#,
        )?;

        let courses = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedCourse {
                course_code: row.get(0)?,
                course_name: row.get(1)?,
                chunk_count: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        Ok(courses.filter_map(|c| c.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn get_by_course_code(&self, course_code: &str) -> Result<Vec<ChunkRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, course_code, course_name, chunk_type, chunk_label,
                   source_url, text, embedding, ingested_at
            FROM chunks
            WHERE course_code = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![course_code.to_uppercase()], Self::row_to_record)?;
        let result: Vec<ChunkRecord> = rows.filter_map(|r| r.ok()).collect();
        debug!("Found {} chunks for course {}", result.len(), course_code);
        Ok(result)
    }

    async fn point_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
