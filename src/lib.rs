//! Coursebook - Course Handbook RAG
//!
//! A CLI tool for turning semi-structured course records into a searchable
//! knowledge base and answering natural-language questions about them.
//!
//! # Overview
//!
//! Coursebook allows you to:
//! - Split crawled course records into stable, addressable chunks
//! - Embed and index chunks into a persistent vector collection
//! - Search courses with exact course-code and partial course-name filters
//! - Ask questions and get AI-powered answers with course-code citations
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `course` - Course record model and course-code resolution
//! - `chunking` - Field chunking, chunk identity, junk filtering
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector collection abstraction
//! - `index` - Embedding index writer (artifacts + upsert)
//! - `retrieval` - Filtered retrieval and quality gating
//! - `rag` - Context assembly and answer generation with fallback
//! - `orchestrator` - Ingestion pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use coursebook::config::Settings;
//! use coursebook::orchestrator::Orchestrator;
//! use coursebook::index::UpsertMode;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Chunk, embed and index every course JSON file in a directory
//!     let report = orchestrator
//!         .build(Path::new("data/courses"), UpsertMode::Rebuild)
//!         .await?;
//!     println!("Indexed {} chunks", report.chunks_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod course;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod vector_store;

pub use error::{CoursebookError, Result};
