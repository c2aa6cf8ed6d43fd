//! Retrieval-augmented answering.
//!
//! [`context`] assembles retrieved chunks into a cited, budgeted context
//! block; [`engine`] drives the retrieve, gate, assemble and generate
//! pipeline with a single unfiltered fallback retry.

pub mod context;
pub mod engine;

pub use context::build_context;
pub use engine::{RagAnswer, RagEngine, RagOptions};
