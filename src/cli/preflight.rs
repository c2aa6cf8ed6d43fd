//! Pre-flight checks before expensive operations.
//!
//! Embedding and generation both call the OpenAI API; failing fast on a
//! missing key beats failing halfway through a batch.

use crate::error::{CoursebookError, Result};

/// Check if the OpenAI API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(CoursebookError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(CoursebookError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
