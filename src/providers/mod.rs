mod factory;
mod ollama;
mod open_ai;
mod prompt;

pub use factory::ProviderFactory;
pub use ollama::OllamaProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_system_prompt, field_key, language_name};

use crate::error::Result;
use async_trait::async_trait;

/// A chat-completion style language model endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Send one system instruction and one user message, return the raw reply text
    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String>;
}
