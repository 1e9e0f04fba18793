use crate::config::LlmConfig;
use crate::error::{ImportError, Result};
use crate::providers::LlmProvider;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ImportError::ProviderError(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        Ok(OpenAIProvider {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 2000,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"}
        });

        chat_completion(
            &self.client,
            &format!("{}/v1/chat/completions", self.base_url),
            Some(&self.api_key),
            &body,
        )
        .await
    }
}

/// POST an OpenAI-compatible chat completion and return the first choice's content.
pub(crate) async fn chat_completion(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
) -> Result<String> {
    let mut request = client.post(url).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ImportError::LlmRequestError(e.to_string()))?;
    let status = response.status();
    let response_body: Value = response
        .json()
        .await
        .map_err(|e| ImportError::LlmRequestError(format!("{status}: {e}")))?;
    debug!("Completion response: {:?}", response_body);

    if !status.is_success() {
        let message = response_body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| response_body["error"].to_string());
        return Err(ImportError::LlmRequestError(format!("{status}: {message}")));
    }

    response_body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ImportError::LlmRequestError("Failed to extract content from response".to_string())
        })
}
