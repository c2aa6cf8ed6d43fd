//! Upsert command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::index::UpsertMode;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the upsert command: load index artifacts into the collection.
pub async fn run_upsert(
    artifacts_dir: Option<String>,
    db: Option<String>,
    incremental: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(db) = db {
        settings.vector_store.sqlite_path = db;
    }
    let artifacts_dir = artifacts_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.artifacts_dir());
    let orchestrator = Orchestrator::new(settings)?;

    let mode = if incremental {
        UpsertMode::Incremental
    } else {
        UpsertMode::Rebuild
    };
    Output::info(&format!(
        "Upserting artifacts from {} ({:?})",
        artifacts_dir.display(),
        mode
    ));

    match orchestrator.upsert_artifacts(&artifacts_dir, mode).await {
        Ok(count) => {
            Output::kv(
                "Collection size",
                &orchestrator.vector_store().point_count().await?.to_string(),
            );
            Output::success(&format!("Upserted {} points", count));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Upsert failed: {}", e));
            Err(e.into())
        }
    }
}
