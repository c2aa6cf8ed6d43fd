//! Embedding index writer.
//!
//! Turns accepted chunks into row-aligned (vector, payload) pairs and
//! persists them, either as co-located file artifacts (for audit and later
//! upsert) or directly into the live vector collection.
//!
//! Integrity rules are enforced before anything is persisted: every row has
//! a non-empty id, ids are unique within the batch, and vector rows equal
//! payload rows. Violations abort with a fatal error — duplicate ids mean a
//! broken identity function and must never silently overwrite.

use crate::chunking::{is_junk, Chunk};
use crate::embedding::{l2_normalize, Embedder};
use crate::error::{CoursebookError, Result};
use crate::vector_store::{ChunkRecord, VectorStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Vector artifact filename: raw little-endian f32, row-major.
pub const EMBEDDINGS_FILE: &str = "embeddings.f32";
/// Payload artifact filename: row-aligned chunk JSONL.
pub const PAYLOADS_FILE: &str = "payloads.jsonl";
/// Manifest filename.
pub const MANIFEST_FILE: &str = "manifest.json";

/// How a prepared batch is applied to the live collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Drop and recreate the collection; points absent from this batch are lost.
    Rebuild,
    /// Create the collection only if absent, then upsert by id, preserving
    /// points not included in this batch.
    Incremental,
}

/// Index manifest, written next to the vectors and payloads for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub created_at: DateTime<Utc>,
    pub n_points: usize,
    pub dim: usize,
    pub embed_model: String,
    pub source_jsonl: String,
}

/// A validated, embedded batch ready for persistence.
///
/// `vectors[i]` is the L2-normalized embedding of `rows[i]`.
#[derive(Debug)]
pub struct IndexBatch {
    pub rows: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
    pub dim: usize,
}

impl IndexBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validate batch identity invariants: non-empty ids, no duplicates.
pub fn validate_ids(rows: &[Chunk]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
    for row in rows {
        if row.id.trim().is_empty() {
            return Err(CoursebookError::IndexWrite(
                "Row missing id; chunk identity generation is broken".to_string(),
            ));
        }
        if !seen.insert(row.id.as_str()) {
            return Err(CoursebookError::IndexWrite(format!(
                "Duplicate chunk id detected: {}",
                row.id
            )));
        }
    }
    Ok(())
}

/// Builds row-aligned embedding batches and persists them.
pub struct IndexWriter {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl IndexWriter {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Junk-filter, validate and embed a chunk sequence.
    #[instrument(skip(self, chunks), fields(input = chunks.len()))]
    pub async fn prepare(&self, chunks: Vec<Chunk>) -> Result<IndexBatch> {
        let input_count = chunks.len();
        let rows: Vec<Chunk> = chunks.into_iter().filter(|c| !is_junk(&c.text)).collect();
        let dropped = input_count - rows.len();
        if dropped > 0 {
            warn!("Junk filter dropped {} of {} rows", dropped, input_count);
        }
        if rows.is_empty() {
            return Err(CoursebookError::IndexWrite(
                "No rows survived filtering; check the chunk input".to_string(),
            ));
        }

        validate_ids(&rows)?;

        let texts: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(rows.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embedder.embed_batch(batch).await?);
        }

        if vectors.len() != rows.len() {
            return Err(CoursebookError::IndexWrite(format!(
                "Embedding rows {} != payload rows {}",
                vectors.len(),
                rows.len()
            )));
        }

        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        if dim == 0 {
            return Err(CoursebookError::IndexWrite(
                "Embedding model produced zero-dimension vectors".to_string(),
            ));
        }
        for vector in &mut vectors {
            if vector.len() != dim {
                return Err(CoursebookError::IndexWrite(format!(
                    "Inconsistent vector dimension: expected {}, got {}",
                    dim,
                    vector.len()
                )));
            }
            l2_normalize(vector);
        }

        info!("Prepared {} rows (dim={})", rows.len(), dim);
        Ok(IndexBatch { rows, vectors, dim })
    }

    /// Write the three co-located artifacts: raw vectors, row-aligned
    /// payloads, and the manifest.
    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    pub fn write_artifacts(&self, batch: &IndexBatch, out_dir: &Path, source: &str) -> Result<Manifest> {
        std::fs::create_dir_all(out_dir)?;

        let mut emb_bytes: Vec<u8> = Vec::with_capacity(batch.len() * batch.dim * 4);
        for vector in &batch.vectors {
            for value in vector {
                emb_bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        std::fs::write(out_dir.join(EMBEDDINGS_FILE), emb_bytes)?;

        let mut payloads = std::fs::File::create(out_dir.join(PAYLOADS_FILE))?;
        for row in &batch.rows {
            serde_json::to_writer(&mut payloads, row)?;
            payloads.write_all(b"\n")?;
        }

        let manifest = Manifest {
            created_at: Utc::now(),
            n_points: batch.len(),
            dim: batch.dim,
            embed_model: self.embedder.model_id().to_string(),
            source_jsonl: source.to_string(),
        };
        std::fs::write(
            out_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        info!("Wrote {} points to {:?}", batch.len(), out_dir);
        Ok(manifest)
    }

    /// Apply a prepared batch to the live collection.
    #[instrument(skip(self, batch, store), fields(rows = batch.len()))]
    pub async fn upsert(
        &self,
        batch: &IndexBatch,
        store: &dyn VectorStore,
        mode: UpsertMode,
    ) -> Result<usize> {
        upsert_rows(store, &batch.rows, &batch.vectors, mode, self.batch_size).await
    }
}

/// Load previously written artifacts, re-checking alignment and ids.
pub fn load_artifacts(dir: &Path) -> Result<(Vec<Chunk>, Vec<Vec<f32>>, Manifest)> {
    let manifest: Manifest =
        serde_json::from_str(&std::fs::read_to_string(dir.join(MANIFEST_FILE))?)?;

    let file = std::fs::File::open(dir.join(PAYLOADS_FILE))?;
    let mut rows: Vec<Chunk> = Vec::with_capacity(manifest.n_points);
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    validate_ids(&rows)?;

    let bytes = std::fs::read(dir.join(EMBEDDINGS_FILE))?;
    if manifest.dim == 0 || bytes.len() % (manifest.dim * 4) != 0 {
        return Err(CoursebookError::IndexWrite(format!(
            "Vector file size {} does not divide into dim-{} rows",
            bytes.len(),
            manifest.dim
        )));
    }
    let vectors: Vec<Vec<f32>> = bytes
        .chunks_exact(manifest.dim * 4)
        .map(|row| {
            row.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
        .collect();

    if vectors.len() != rows.len() {
        return Err(CoursebookError::IndexWrite(format!(
            "Embedding rows {} != payload rows {}",
            vectors.len(),
            rows.len()
        )));
    }

    Ok((rows, vectors, manifest))
}

/// Upsert row-aligned chunks and vectors into a collection in fixed-size
/// batches.
pub async fn upsert_rows(
    store: &dyn VectorStore,
    rows: &[Chunk],
    vectors: &[Vec<f32>],
    mode: UpsertMode,
    batch_size: usize,
) -> Result<usize> {
    if rows.len() != vectors.len() {
        return Err(CoursebookError::IndexWrite(format!(
            "Embedding rows {} != payload rows {}",
            vectors.len(),
            rows.len()
        )));
    }
    validate_ids(rows)?;

    if mode == UpsertMode::Rebuild {
        let dropped = store.clear().await?;
        info!("Rebuild: cleared {} existing points", dropped);
    }

    let records: Vec<ChunkRecord> = rows
        .iter()
        .cloned()
        .zip(vectors.iter().cloned())
        .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
        .collect();

    let mut written = 0;
    for batch in records.chunks(batch_size.max(1)) {
        written += store.upsert_batch(batch).await?;
    }

    info!("Upserted {} points ({:?})", written, mode);
    Ok(written)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::embedding::{l2_normalize, Embedder};
    use crate::error::Result;
    use async_trait::async_trait;

    /// Deterministic embedder for tests: hashes bytes into a small vector.
    pub struct HashEmbedder {
        dim: usize,
    }

    impl HashEmbedder {
        pub fn new(dim: usize) -> Self {
            Self { dim }
        }
    }

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; self.dim];
            for (i, b) in text.bytes().enumerate() {
                v[i % self.dim] += b as f32;
            }
            l2_normalize(&mut v);
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            self.dim
        }

        fn model_id(&self) -> &str {
            "hash-embedder-test"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::HashEmbedder;
    use super::*;
    use crate::chunking::{ChunkMeta, ChunkType};
    use crate::vector_store::MemoryVectorStore;

    fn chunk(id: &str, course_code: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            meta: ChunkMeta {
                course_code: course_code.to_string(),
                course_name: "Bachelor of Testing".to_string(),
                chunk_type: ChunkType::Overview,
                chunk_label: "Overview".to_string(),
                source_url: String::new(),
                ingested_at: Utc::now(),
            },
        }
    }

    fn long_text(seed: &str) -> String {
        format!(
            "Overview:\n{} course content long enough to clear the junk filter threshold.",
            seed
        )
    }

    fn writer() -> IndexWriter {
        IndexWriter::new(Arc::new(HashEmbedder::new(8)), 2)
    }

    #[tokio::test]
    async fn test_prepare_aligns_rows_and_vectors() {
        let chunks = vec![
            chunk("a", "C10302", &long_text("first")),
            chunk("b", "C10302", &long_text("second")),
            chunk("c", "C20060", &long_text("third")),
        ];

        let batch = writer().prepare(chunks).await.unwrap();
        assert_eq!(batch.rows.len(), batch.vectors.len());
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.dim, 8);

        for vector in &batch.vectors {
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "vectors must be normalized");
        }
    }

    #[tokio::test]
    async fn test_prepare_applies_junk_filter() {
        let chunks = vec![
            chunk("a", "C10302", &long_text("keep")),
            chunk("b", "C10302", "short"),
            chunk("c", "C10302", "Page 1 of 2"),
        ];

        let batch = writer().prepare(chunks).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows[0].id, "a");
    }

    #[tokio::test]
    async fn test_prepare_fails_when_nothing_survives() {
        let chunks = vec![chunk("a", "C10302", "short")];
        let err = writer().prepare(chunks).await.unwrap_err();
        assert!(matches!(err, CoursebookError::IndexWrite(_)));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_fatal() {
        let chunks = vec![
            chunk("a", "C10302", &long_text("first")),
            chunk("a", "C10302", &long_text("second")),
        ];
        let err = writer().prepare(chunks).await.unwrap_err();
        assert!(matches!(err, CoursebookError::IndexWrite(_)));
        assert!(err.to_string().contains("Duplicate"));
    }

    #[tokio::test]
    async fn test_missing_id_is_fatal() {
        let chunks = vec![chunk("  ", "C10302", &long_text("first"))];
        let err = writer().prepare(chunks).await.unwrap_err();
        assert!(matches!(err, CoursebookError::IndexWrite(_)));
        assert!(err.to_string().contains("missing id"));
    }

    #[tokio::test]
    async fn test_upsert_rows_rejects_misaligned_inputs() {
        let store = MemoryVectorStore::new();
        let rows = vec![chunk("a", "C10302", &long_text("first"))];
        let vectors: Vec<Vec<f32>> = Vec::new();

        let err = upsert_rows(&store, &rows, &vectors, UpsertMode::Rebuild, 64)
            .await
            .unwrap_err();
        assert!(matches!(err, CoursebookError::IndexWrite(_)));
        assert_eq!(store.point_count().await.unwrap(), 0, "nothing may be written");
    }

    #[tokio::test]
    async fn test_artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer();
        let chunks = vec![
            chunk("a", "C10302", &long_text("first")),
            chunk("b", "C20060", &long_text("second")),
        ];

        let batch = w.prepare(chunks).await.unwrap();
        let manifest = w
            .write_artifacts(&batch, dir.path(), "chunks.jsonl")
            .unwrap();
        assert_eq!(manifest.n_points, 2);
        assert_eq!(manifest.dim, 8);
        assert_eq!(manifest.embed_model, "hash-embedder-test");

        let (rows, vectors, loaded) = load_artifacts(dir.path()).unwrap();
        assert_eq!(loaded.n_points, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(vectors.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(vectors[0], batch.vectors[0]);
    }

    #[tokio::test]
    async fn test_rebuild_vs_incremental() {
        let store = MemoryVectorStore::new();
        let w = writer();

        let first = w
            .prepare(vec![chunk("a", "C10302", &long_text("first"))])
            .await
            .unwrap();
        w.upsert(&first, &store, UpsertMode::Rebuild).await.unwrap();
        assert_eq!(store.point_count().await.unwrap(), 1);

        // Incremental keeps existing points.
        let second = w
            .prepare(vec![chunk("b", "C20060", &long_text("second"))])
            .await
            .unwrap();
        w.upsert(&second, &store, UpsertMode::Incremental)
            .await
            .unwrap();
        assert_eq!(store.point_count().await.unwrap(), 2);

        // Rebuild drops points absent from the batch.
        let third = w
            .prepare(vec![chunk("c", "C30010", &long_text("third"))])
            .await
            .unwrap();
        w.upsert(&third, &store, UpsertMode::Rebuild).await.unwrap();
        assert_eq!(store.point_count().await.unwrap(), 1);
    }
}
