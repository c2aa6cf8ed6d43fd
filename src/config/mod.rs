//! Configuration management for Coursebook.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ContextSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, IndexSettings,
    PromptSettings, RetrievalSettings, Settings, VectorStoreSettings,
};
