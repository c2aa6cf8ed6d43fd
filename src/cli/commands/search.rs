//! Search command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::retrieval::QualityReport;
use crate::vector_store::QueryFilter;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course_code: Option<String>,
    course_name: Option<String>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check_api_key() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let filter = QueryFilter {
        course_code: course_code.map(|c| c.to_uppercase()),
        course_name,
    };

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, Some(&filter), limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::info("No results found.");
            } else {
                for result in &results {
                    Output::search_result(
                        &result.record.meta.course_code,
                        &result.record.meta.chunk_label,
                        result.score,
                        &result.record.text,
                        &result.record.meta.source_url,
                    );
                }
                println!();
                Output::kv("Quality", &QualityReport::evaluate(&results).to_string());
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
