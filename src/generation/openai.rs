//! OpenAI chat-completion generator.

use super::Generator;
use crate::error::{CoursebookError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based generator with a fixed wall-clock request timeout. A call
/// that exceeds the timeout fails, which the RAG engine turns into its
/// fallback path.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIGenerator {
    /// Create a new generator for the given model and request timeout.
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, system, user))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| CoursebookError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| CoursebookError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.2)
            .build()
            .map_err(|e| CoursebookError::Rag(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            CoursebookError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
