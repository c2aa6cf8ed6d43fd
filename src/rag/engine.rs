//! RAG question answering engine.
//!
//! Pipeline per question: retrieve (optionally filtered), log the quality
//! gate, assemble a budgeted context, generate. If the filtered attempt
//! fails with an error, one unfiltered fallback attempt runs; a second
//! failure propagates.

use super::context::build_context;
use crate::config::RagPrompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::retrieval::{FilteredRetriever, QualityReport};
use crate::vector_store::{QueryFilter, SearchResult, VectorStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fixed reply when retrieval returns nothing.
pub const NO_RESULTS_MESSAGE: &str = "No relevant course information found.";
/// Fixed reply when the model returns an empty answer.
pub const EMPTY_ANSWER_MESSAGE: &str =
    "I couldn't generate a response. Please try rephrasing your question.";

/// Per-engine tuning knobs, taken from [`crate::config::Settings`].
#[derive(Debug, Clone)]
pub struct RagOptions {
    /// Hits fetched from the collection.
    pub top_k: usize,
    /// Hits passed to context assembly.
    pub top_n: usize,
    /// Context character budget (chunk text only).
    pub max_context_chars: usize,
    /// Brief answers vs comprehensive ones.
    pub concise: bool,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            top_k: 30,
            top_n: 8,
            max_context_chars: super::context::DEFAULT_MAX_CHARS,
            concise: true,
        }
    }
}

/// A cited source accompanying an answer.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub course_code: String,
    pub course_name: String,
    pub chunk_label: String,
    pub source_url: String,
    pub score: f32,
}

impl From<&SearchResult> for Source {
    fn from(hit: &SearchResult) -> Self {
        Self {
            course_code: hit.record.meta.course_code.clone(),
            course_name: hit.record.meta.course_name.clone(),
            chunk_label: hit.record.meta.chunk_label.clone(),
            source_url: hit.record.meta.source_url.clone(),
            score: hit.score,
        }
    }
}

/// A generated answer with its supporting sources.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
    pub quality: QualityReport,
    pub used_fallback: bool,
}

/// Drives retrieval, context assembly and generation.
pub struct RagEngine {
    retriever: FilteredRetriever,
    generator: Arc<dyn Generator>,
    prompts: RagPrompts,
    options: RagOptions,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        prompts: RagPrompts,
        options: RagOptions,
    ) -> Self {
        Self {
            retriever: FilteredRetriever::new(store, embedder),
            generator,
            prompts,
            options,
        }
    }

    /// Answer a question, optionally constrained to matching courses.
    ///
    /// A failing filtered attempt triggers exactly one unfiltered retry;
    /// an error from the retry propagates.
    #[instrument(skip(self, question, filter))]
    pub async fn ask(&self, question: &str, filter: Option<&QueryFilter>) -> Result<RagAnswer> {
        match self.answer_once(question, filter, false).await {
            Ok(answer) => Ok(answer),
            Err(err) => {
                warn!("Primary attempt failed, retrying unfiltered: {}", err);
                self.answer_once(question, None, true).await
            }
        }
    }

    async fn answer_once(
        &self,
        question: &str,
        filter: Option<&QueryFilter>,
        used_fallback: bool,
    ) -> Result<RagAnswer> {
        let hits = self
            .retriever
            .retrieve(question, filter, self.options.top_k)
            .await?;

        let quality = QualityReport::evaluate(&hits);
        quality.log();

        if hits.is_empty() {
            return Ok(RagAnswer {
                answer: NO_RESULTS_MESSAGE.to_string(),
                sources: Vec::new(),
                quality,
                used_fallback,
            });
        }

        let top = &hits[..self.options.top_n.min(hits.len())];
        let context = build_context(top, self.options.max_context_chars);
        let sources: Vec<Source> = top.iter().map(Source::from).collect();

        let system = self.prompts.system(self.options.concise);
        let user = self.prompts.user(self.options.concise, question, &context);
        let mut answer = self.generator.generate(system, &user).await?;

        if answer.trim().is_empty() {
            answer = EMPTY_ANSWER_MESSAGE.to_string();
        }

        info!(
            "Answered with {} sources (fallback: {})",
            sources.len(),
            used_fallback
        );
        Ok(RagAnswer {
            answer,
            sources,
            quality,
            used_fallback,
        })
    }
}
