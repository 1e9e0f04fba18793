use crate::config::LlmConfig;
use crate::error::{ImportError, Result};
use crate::providers::{LlmProvider, OllamaProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the configured provider instance
    pub fn create(config: &LlmConfig, timeout: Duration) -> Result<Box<dyn LlmProvider>> {
        match config.provider.as_str() {
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            "ollama" => Ok(Box::new(OllamaProvider::new(config, timeout)?)),
            other => Err(ImportError::ProviderError(format!(
                "Unknown provider: {other} (available: {})",
                Self::available_providers().join(", ")
            ))),
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "ollama"]
    }
}
