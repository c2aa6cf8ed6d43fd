//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.list_courses().await {
        Ok(courses) => {
            if courses.is_empty() {
                Output::info(
                    "No courses indexed yet. Use 'coursebook build <dir>' to add content.",
                );
            } else {
                Output::header(&format!("Indexed Courses ({})", courses.len()));
                println!();

                for course in &courses {
                    Output::course_info(
                        &course.course_code,
                        &course.course_name,
                        course.chunk_count,
                    );
                }

                let total_chunks: u32 = courses.iter().map(|c| c.chunk_count).sum();
                println!();
                Output::kv("Total courses", &courses.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
