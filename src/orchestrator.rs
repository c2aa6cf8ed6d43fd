//! Pipeline orchestrator for Coursebook.
//!
//! Coordinates the process from course JSON files to an answerable index:
//! chunking, embedding, artifact writing and collection upsert.

use crate::chunking::{Chunk, FieldChunker};
use crate::config::{Prompts, Settings};
use crate::course::CourseRecord;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{CoursebookError, Result};
use crate::generation::{Generator, OpenAIGenerator};
use crate::index::{load_artifacts, upsert_rows, IndexWriter, Manifest, UpsertMode};
use crate::rag::{RagAnswer, RagEngine, RagOptions};
use crate::vector_store::{
    IndexedCourse, MemoryVectorStore, QueryFilter, SearchResult, SqliteVectorStore, VectorStore,
};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Coursebook pipeline.
pub struct Orchestrator {
    settings: Settings,
    chunker: FieldChunker,
    writer: IndexWriter,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    engine: RagEngine,
}

impl Orchestrator {
    /// Create a new orchestrator with default components from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            other => {
                return Err(CoursebookError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(
            &settings.generation.model,
            Duration::from_secs(settings.generation.timeout_seconds),
        ));

        Self::with_components(settings, prompts, embedder, vector_store, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let options = RagOptions {
            top_k: settings.retrieval.top_k,
            top_n: settings.retrieval.top_n,
            max_context_chars: settings.context.max_chars,
            concise: settings.generation.concise,
        };
        let engine = RagEngine::new(
            vector_store.clone(),
            embedder.clone(),
            generator,
            prompts.rag.clone(),
            options,
        );

        Ok(Self {
            chunker: FieldChunker::new(),
            writer: IndexWriter::new(embedder.clone(), settings.index.batch_size),
            settings,
            embedder,
            vector_store,
            engine,
        })
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Chunk every course JSON file under a directory.
    ///
    /// Files that fail to parse are reported and skipped; one bad record
    /// never aborts the run.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CoursebookError::Ingest(format!(
                "No .json course files found in {}",
                dir.display()
            )));
        }

        let mut report = IngestReport::default();
        for path in paths {
            match self.ingest_file(&path) {
                Ok(chunks) if chunks.is_empty() => {
                    warn!("No usable fields in {}", path.display());
                    report.outcomes.push(FileOutcome {
                        path,
                        status: FileStatus::Skipped("no usable fields".to_string()),
                    });
                }
                Ok(chunks) => {
                    report.outcomes.push(FileOutcome {
                        path,
                        status: FileStatus::Chunked(chunks.len()),
                    });
                    report.chunks.extend(chunks);
                }
                Err(err) => {
                    warn!("Failed to ingest {}: {}", path.display(), err);
                    report.outcomes.push(FileOutcome {
                        path,
                        status: FileStatus::Failed(err.to_string()),
                    });
                }
            }
        }

        info!(
            "Ingested {} chunks from {} files ({} failed, {} skipped)",
            report.chunks.len(),
            report.outcomes.len(),
            report.failed(),
            report.skipped()
        );
        Ok(report)
    }

    /// Chunk a single course JSON file. The file stem doubles as the
    /// uniqueness token so that distinct files never collide on chunk ids.
    pub fn ingest_file(&self, path: &Path) -> Result<Vec<Chunk>> {
        let token = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CoursebookError::Ingest(format!("Unreadable file name: {}", path.display()))
            })?
            .to_string();

        let content = std::fs::read_to_string(path)?;
        let record: CourseRecord = serde_json::from_str(&content)
            .map_err(|e| CoursebookError::Ingest(format!("{}: {}", path.display(), e)))?;

        Ok(self.chunker.chunk(&record, &token))
    }

    /// Write chunks to a JSONL exchange file, one chunk per line.
    pub fn write_chunks_jsonl(&self, chunks: &[Chunk], path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for chunk in chunks {
            serde_json::to_writer(&mut file, chunk)?;
            file.write_all(b"\n")?;
        }
        Ok(chunks.len())
    }

    /// Read chunks back from a JSONL exchange file.
    pub fn read_chunks_jsonl(&self, path: &Path) -> Result<Vec<Chunk>> {
        let file = std::fs::File::open(path)?;
        let mut chunks = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            chunks.push(serde_json::from_str(&line)?);
        }
        Ok(chunks)
    }

    /// Embed chunks and write the index artifacts.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn index_chunks(
        &self,
        chunks: Vec<Chunk>,
        out_dir: &Path,
        source: &str,
    ) -> Result<Manifest> {
        let batch = self.writer.prepare(chunks).await?;
        self.writer.write_artifacts(&batch, out_dir, source)
    }

    /// Load previously written artifacts and upsert them into the collection.
    #[instrument(skip(self), fields(dir = %artifacts_dir.display()))]
    pub async fn upsert_artifacts(
        &self,
        artifacts_dir: &Path,
        mode: UpsertMode,
    ) -> Result<usize> {
        let (rows, vectors, manifest) = load_artifacts(artifacts_dir)?;
        info!(
            "Loaded {} points (dim={}, model={})",
            manifest.n_points, manifest.dim, manifest.embed_model
        );
        upsert_rows(
            self.vector_store.as_ref(),
            &rows,
            &vectors,
            mode,
            self.settings.index.batch_size,
        )
        .await
    }

    /// End-to-end build: chunk a course directory, embed, and upsert into
    /// the live collection.
    #[instrument(skip(self), fields(dir = %courses_dir.display()))]
    pub async fn build(&self, courses_dir: &Path, mode: UpsertMode) -> Result<BuildReport> {
        let ingest = self.ingest_dir(courses_dir)?;
        let batch = self.writer.prepare(ingest.chunks.clone()).await?;
        let indexed = self.writer.upsert(&batch, self.vector_store.as_ref(), mode).await?;

        Ok(BuildReport {
            files_processed: ingest.outcomes.len(),
            files_failed: ingest.failed(),
            chunks_indexed: indexed,
        })
    }

    /// Search the collection without generating an answer.
    pub async fn search(
        &self,
        question: &str,
        filter: Option<&QueryFilter>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(question).await?;
        self.vector_store
            .search(&embedding, filter.filter(|f| !f.is_empty()), limit)
            .await
    }

    /// Answer a question over the indexed courses.
    pub async fn ask(&self, question: &str, filter: Option<&QueryFilter>) -> Result<RagAnswer> {
        self.engine.ask(question, filter).await
    }

    /// List all indexed courses.
    pub async fn list_courses(&self) -> Result<Vec<IndexedCourse>> {
        self.vector_store.list_courses().await
    }
}

/// Per-file ingest status.
#[derive(Debug)]
pub enum FileStatus {
    /// File produced this many chunks.
    Chunked(usize),
    /// File parsed but yielded nothing usable.
    Skipped(String),
    /// File could not be read or parsed.
    Failed(String),
}

/// One ingested file and what happened to it.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Result of chunking a course directory.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub chunks: Vec<Chunk>,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Skipped(_)))
            .count()
    }
}

/// Result of an end-to-end build.
#[derive(Debug)]
pub struct BuildReport {
    pub files_processed: usize,
    pub files_failed: usize,
    pub chunks_indexed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::HashEmbedder;
    use async_trait::async_trait;

    struct NoopGenerator;

    #[async_trait]
    impl Generator for NoopGenerator {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            Ok("answer".to_string())
        }

        fn model_id(&self) -> &str {
            "noop"
        }
    }

    fn test_orchestrator() -> Orchestrator {
        Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(HashEmbedder::new(8)),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(NoopGenerator),
        )
        .unwrap()
    }

    fn write_course(dir: &Path, name: &str, json: &str) {
        std::fs::write(dir.join(name), json).unwrap();
    }

    const COURSE_JSON: &str = r#"{
        "course_code": "C10302",
        "course_name": "Bachelor of Sport and Exercise Science",
        "overview": "This degree prepares graduates for careers in sport and exercise science with extensive practical experience across laboratories and industry placements.",
        "career_options": "Graduates work as exercise scientists, performance analysts, strength and conditioning coaches, and sport development officers across clubs and institutes."
    }"#;

    #[tokio::test]
    async fn test_build_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_course(dir.path(), "c10302.json", COURSE_JSON);
        write_course(dir.path(), "broken.json", "{not json");

        let orchestrator = test_orchestrator();
        let report = orchestrator
            .build(dir.path(), UpsertMode::Rebuild)
            .await
            .unwrap();

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_failed, 1);
        assert!(report.chunks_indexed >= 3, "overview, careers, course info");

        let courses = orchestrator.list_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course_code, "C10302");

        let answer = orchestrator.ask("What careers?", None).await.unwrap();
        assert_eq!(answer.answer, "answer");
    }

    #[tokio::test]
    async fn test_ingest_dir_requires_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = test_orchestrator();
        let err = orchestrator.ingest_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CoursebookError::Ingest(_)));
    }

    #[tokio::test]
    async fn test_chunks_jsonl_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_course(dir.path(), "c10302.json", COURSE_JSON);

        let orchestrator = test_orchestrator();
        let report = orchestrator.ingest_dir(dir.path()).unwrap();
        let path = dir.path().join("out/chunks.jsonl");

        let written = orchestrator
            .write_chunks_jsonl(&report.chunks, &path)
            .unwrap();
        let read_back = orchestrator.read_chunks_jsonl(&path).unwrap();

        assert_eq!(written, read_back.len());
        assert_eq!(report.chunks[0].id, read_back[0].id);
    }

    #[tokio::test]
    async fn test_artifacts_then_upsert() {
        let courses = tempfile::tempdir().unwrap();
        let artifacts = tempfile::tempdir().unwrap();
        write_course(courses.path(), "c10302.json", COURSE_JSON);

        let orchestrator = test_orchestrator();
        let report = orchestrator.ingest_dir(courses.path()).unwrap();
        let manifest = orchestrator
            .index_chunks(report.chunks, artifacts.path(), "chunks.jsonl")
            .await
            .unwrap();
        assert!(manifest.n_points >= 3);

        let upserted = orchestrator
            .upsert_artifacts(artifacts.path(), UpsertMode::Incremental)
            .await
            .unwrap();
        assert_eq!(upserted, manifest.n_points);
        assert_eq!(
            orchestrator.vector_store().point_count().await.unwrap(),
            manifest.n_points
        );
    }
}
