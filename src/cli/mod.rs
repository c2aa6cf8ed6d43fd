//! CLI module for Coursebook.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Coursebook - Course Handbook RAG
///
/// A CLI tool for chunking course handbook records, building an embedding
/// index, and answering questions over it with cited sources.
#[derive(Parser, Debug)]
#[command(name = "coursebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk course JSON files into a JSONL exchange file
    Ingest {
        /// Directory of course JSON files
        courses_dir: String,

        /// Output chunks file
        #[arg(short, long, default_value = "chunks.jsonl")]
        output: String,

        /// Chunk and report without writing the output file
        #[arg(long)]
        dry_run: bool,
    },

    /// Embed a chunks file and write index artifacts
    Index {
        /// Chunks JSONL file produced by 'ingest'
        chunks_file: String,

        /// Directory for embeddings.f32 / payloads.jsonl / manifest.json
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Embedding model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Rows per embedding request
        #[arg(short, long)]
        batch: Option<usize>,
    },

    /// Upsert previously written index artifacts into the collection
    Upsert {
        /// Artifacts directory produced by 'index'
        #[arg(short, long)]
        artifacts_dir: Option<String>,

        /// SQLite database path for the collection
        #[arg(long)]
        db: Option<String>,

        /// Upsert by id, preserving points not in these artifacts
        /// (default drops and recreates the collection)
        #[arg(long)]
        incremental: bool,
    },

    /// Chunk, embed and upsert a course directory in one pass
    Build {
        /// Directory of course JSON files
        courses_dir: String,

        /// Upsert by id, preserving points not in this directory
        /// (default drops and recreates the collection)
        #[arg(long)]
        incremental: bool,
    },

    /// Search for relevant course chunks
    Search {
        /// Search query
        query: String,

        /// Restrict to an exact course code
        #[arg(long)]
        course_code: Option<String>,

        /// Restrict to a partial course name
        #[arg(long)]
        course_name: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Ask a question and get an answer with cited sources
    Ask {
        /// The question to ask
        question: String,

        /// Restrict to an exact course code (detected from the question if omitted)
        #[arg(long)]
        course_code: Option<String>,

        /// Restrict to a partial course name
        #[arg(long)]
        course_name: Option<String>,

        /// Provide a comprehensive answer instead of a brief one
        #[arg(long)]
        comprehensive: bool,

        /// Hits to fetch from the collection
        #[arg(long)]
        top_k: Option<usize>,

        /// Hits to pass to context assembly
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// List indexed courses
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
