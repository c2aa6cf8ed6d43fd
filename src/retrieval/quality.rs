//! Advisory quality assessment of a retrieval result set.
//!
//! The report is logged alongside every answer so that weak retrievals can
//! be diagnosed later; it never blocks answering.

use crate::vector_store::SearchResult;
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Minimum hit count for the `min_results` flag.
const MIN_RESULTS: usize = 3;
/// Top score above which the result set counts as high quality.
const HIGH_QUALITY_SCORE: f32 = 0.3;
/// How many top hits are inspected for source diversity.
const DIVERSITY_WINDOW: usize = 3;

/// Four advisory flags describing a retrieval result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityReport {
    /// At least one hit came back.
    pub has_results: bool,
    /// At least three hits came back.
    pub min_results: bool,
    /// The top hit scored above 0.3.
    pub has_high_quality: bool,
    /// The top three hits span more than one course code.
    pub diverse_sources: bool,
}

impl QualityReport {
    /// Evaluate a result set. Hits are assumed ordered by descending score.
    pub fn evaluate(hits: &[SearchResult]) -> Self {
        let codes: HashSet<&str> = hits
            .iter()
            .take(DIVERSITY_WINDOW)
            .map(|h| h.record.meta.course_code.as_str())
            .collect();

        Self {
            has_results: !hits.is_empty(),
            min_results: hits.len() >= MIN_RESULTS,
            has_high_quality: hits.first().map_or(false, |h| h.score > HIGH_QUALITY_SCORE),
            diverse_sources: codes.len() > 1,
        }
    }

    /// Log the report at info level.
    pub fn log(&self) {
        info!(
            has_results = self.has_results,
            min_results = self.min_results,
            has_high_quality = self.has_high_quality,
            diverse_sources = self.diverse_sources,
            "Retrieval quality"
        );
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "has_results={} min_results={} has_high_quality={} diverse_sources={}",
            self.has_results, self.min_results, self.has_high_quality, self.diverse_sources
        )
    }
}
