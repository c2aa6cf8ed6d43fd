//! Prompt templates for Coursebook.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
}


/// Prompts for RAG answer generation.
///
/// Two register variants: concise for chat-style answers, comprehensive for
/// full write-ups. Both instruct the model to stay inside the provided
/// context and cite course codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub concise_system: String,
    pub concise_user: String,
    pub comprehensive_system: String,
    pub comprehensive_user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            concise_system: "You are a helpful assistant for course information. Answer questions about courses using only the provided context. Be brief and direct. Cite sources as [Course Code: XXX]. If the information is not in the context, say you don't know.".to_string(),

            concise_user: "Question: {{question}}\n\nContext:\n{{context}}\n\nAnswer directly and briefly:".to_string(),

            comprehensive_system: "You are a helpful assistant for course information. Answer questions about courses using only the provided context. Provide comprehensive answers. Cite sources as [Course Code: XXX]. If the information is not in the context, say you don't know.".to_string(),

            comprehensive_user: "Question: {{question}}\n\nContext:\n{{context}}\n\nAnswer:".to_string(),
        }
    }
}

impl RagPrompts {
    /// System prompt for the requested register.
    pub fn system(&self, concise: bool) -> &str {
        if concise {
            &self.concise_system
        } else {
            &self.comprehensive_system
        }
    }

    /// Rendered user prompt for the requested register.
    pub fn user(&self, concise: bool, question: &str, context: &str) -> String {
        let template = if concise {
            &self.concise_user
        } else {
            &self.comprehensive_user
        };
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());
        Prompts::render(template, &vars)
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.rag.concise_system.is_empty());
        assert!(prompts.rag.comprehensive_system.contains("comprehensive"));
    }

    #[test]
    fn test_user_prompt_rendering() {
        let prompts = Prompts::default();
        let user = prompts
            .rag
            .user(true, "What is C10302?", "[Course Code: C10302]\nOverview text");
        assert!(user.starts_with("Question: What is C10302?"));
        assert!(user.contains("Overview text"));
        assert!(user.ends_with("Answer directly and briefly:"));
    }

    #[test]
    fn test_register_selection() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system(true).contains("brief"));
        assert!(prompts.rag.system(false).contains("comprehensive"));
    }
}
