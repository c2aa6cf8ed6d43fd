//! Build command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::index::UpsertMode;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the build command: chunk, embed and upsert a course directory.
pub async fn run_build(courses_dir: &str, incremental: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check_api_key() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let mode = if incremental {
        UpsertMode::Incremental
    } else {
        UpsertMode::Rebuild
    };
    Output::info(&format!("Building index from {} ({:?})", courses_dir, mode));

    let spinner = Output::spinner("Chunking, embedding and indexing...");
    let result = orchestrator.build(Path::new(courses_dir), mode).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::kv("Files processed", &report.files_processed.to_string());
            Output::kv("Files failed", &report.files_failed.to_string());
            Output::kv("Chunks indexed", &report.chunks_indexed.to_string());
            Output::success("Index build complete");
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Build failed: {}", e));
            Err(e.into())
        }
    }
}
