//! Index command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the index command: embed a chunks file and write index artifacts.
pub async fn run_index(
    chunks_file: &str,
    out_dir: Option<String>,
    model: Option<String>,
    batch: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check_api_key() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.embedding.model = model;
    }
    if let Some(batch) = batch {
        settings.index.batch_size = batch;
    }
    let out_dir = out_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.artifacts_dir());
    let orchestrator = Orchestrator::new(settings)?;

    let chunks = orchestrator.read_chunks_jsonl(Path::new(chunks_file))?;
    Output::info(&format!("Embedding {} chunks from {}", chunks.len(), chunks_file));

    let spinner = Output::spinner("Generating embeddings...");
    let result = orchestrator.index_chunks(chunks, &out_dir, chunks_file).await;
    spinner.finish_and_clear();

    match result {
        Ok(manifest) => {
            Output::kv("Points", &manifest.n_points.to_string());
            Output::kv("Dimensions", &manifest.dim.to_string());
            Output::kv("Model", &manifest.embed_model);
            Output::success(&format!("Wrote artifacts to {}", out_dir.display()));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
