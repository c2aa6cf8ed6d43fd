//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{FileStatus, Orchestrator};
use anyhow::Result;
use std::path::Path;

/// Run the ingest command: chunk course JSON files into a JSONL file.
pub fn run_ingest(courses_dir: &str, output: &str, dry_run: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Chunking course files in {}", courses_dir));
    let report = orchestrator.ingest_dir(Path::new(courses_dir))?;

    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Chunked(n) => {
                Output::list_item(&format!("{} ({} chunks)", outcome.path.display(), n));
            }
            FileStatus::Skipped(reason) => {
                Output::warning(&format!("{}: skipped ({})", outcome.path.display(), reason));
            }
            FileStatus::Failed(reason) => {
                Output::error(&format!("{}: {}", outcome.path.display(), reason));
            }
        }
    }

    println!();
    Output::kv("Files processed", &report.outcomes.len().to_string());
    Output::kv("Files failed", &report.failed().to_string());

    if dry_run {
        Output::kv("Chunks produced", &report.chunks.len().to_string());
        Output::info("Dry run, nothing written.");
        return Ok(());
    }

    let written = orchestrator.write_chunks_jsonl(&report.chunks, Path::new(output))?;
    Output::kv("Chunks written", &written.to_string());
    Output::success(&format!("Wrote {}", output));

    Ok(())
}
