//! Coursebook CLI entry point.

use anyhow::Result;
use clap::Parser;
use coursebook::cli::{commands, Cli, Commands};
use coursebook::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("coursebook={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest {
            courses_dir,
            output,
            dry_run,
        } => {
            commands::run_ingest(courses_dir, output, *dry_run, settings)?;
        }

        Commands::Index {
            chunks_file,
            out_dir,
            model,
            batch,
        } => {
            commands::run_index(chunks_file, out_dir.clone(), model.clone(), *batch, settings)
                .await?;
        }

        Commands::Upsert {
            artifacts_dir,
            db,
            incremental,
        } => {
            commands::run_upsert(artifacts_dir.clone(), db.clone(), *incremental, settings)
                .await?;
        }

        Commands::Build {
            courses_dir,
            incremental,
        } => {
            commands::run_build(courses_dir, *incremental, settings).await?;
        }

        Commands::Search {
            query,
            course_code,
            course_name,
            limit,
        } => {
            commands::run_search(
                query,
                course_code.clone(),
                course_name.clone(),
                *limit,
                settings,
            )
            .await?;
        }

        Commands::Ask {
            question,
            course_code,
            course_name,
            comprehensive,
            top_k,
            top_n,
        } => {
            commands::run_ask(
                question,
                course_code.clone(),
                course_name.clone(),
                *comprehensive,
                *top_k,
                *top_n,
                settings,
            )
            .await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
