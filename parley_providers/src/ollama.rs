use async_trait::async_trait;
use parley_core::{ChatMessage, ChatModel, LLMResponse, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::ProviderError;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Chat client for a local or remote Ollama server.
///
/// Every call is a single non-streaming `POST /api/chat`. Failures are
/// returned as-is; there is no retry.
pub struct OllamaChatModel {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaChatModel {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let model = model.into();
        info!("Creating OllamaChatModel: model={model}, timeout={timeout:?}");
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            model,
            base_url: OLLAMA_BASE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        })
    }
}

/// Map a non-streaming `/api/chat` body onto an [`LLMResponse`].
fn parse_chat_response(response: &Value) -> anyhow::Result<LLMResponse> {
    let content = response["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing message content"))?
        .to_string();

    let prompt = response["prompt_eval_count"].as_u64();
    let completion = response["eval_count"].as_u64();
    let usage = (prompt.is_some() || completion.is_some()).then(|| {
        let prompt_tokens = u32::try_from(prompt.unwrap_or(0)).unwrap_or(u32::MAX);
        let completion_tokens = u32::try_from(completion.unwrap_or(0)).unwrap_or(u32::MAX);
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> anyhow::Result<LLMResponse> {
        let request = self.build_request(messages);

        info!(
            "Sending request to Ollama: model={}, messages={}",
            self.model,
            messages.len()
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let response = parse_chat_response(&response)?;
        if let Some(usage) = response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        info!("Received response from Ollama");
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
