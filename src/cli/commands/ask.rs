//! Ask command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::course::extract_course_code;
use crate::orchestrator::Orchestrator;
use crate::vector_store::QueryFilter;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    course_code: Option<String>,
    course_name: Option<String>,
    comprehensive: bool,
    top_k: Option<usize>,
    top_n: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check_api_key() {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if comprehensive {
        settings.generation.concise = false;
    }
    if let Some(top_k) = top_k {
        settings.retrieval.top_k = top_k;
    }
    if let Some(top_n) = top_n {
        settings.retrieval.top_n = top_n;
    }
    let orchestrator = Orchestrator::new(settings)?;

    // A course code in the question narrows retrieval even without --course-code.
    let code = course_code
        .map(|c| c.to_uppercase())
        .or_else(|| extract_course_code(question));
    if let Some(code) = &code {
        Output::info(&format!("Filtering by course code {}", code));
    }
    let filter = QueryFilter {
        course_code: code,
        course_name,
    };

    let spinner = Output::spinner("Searching course index...");
    let result = orchestrator.ask(question, Some(&filter)).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if response.used_fallback {
                Output::warning("Filtered retrieval failed; answered from an unfiltered search.");
            }

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::search_result(
                        &source.course_code,
                        &source.chunk_label,
                        source.score,
                        &source.course_name,
                        &source.source_url,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
