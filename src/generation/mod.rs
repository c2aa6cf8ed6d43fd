//! Answer text generation.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text-generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion from a system instruction and a user prompt.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;

    /// Identity of the underlying model.
    fn model_id(&self) -> &str;
}
