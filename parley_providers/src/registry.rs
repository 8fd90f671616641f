use std::str::FromStr;

use parley_config::Config;
use parley_core::ChatModel;
use tracing::info;

use crate::{OllamaChatModel, ProviderError};

/// Model providers this crate can construct clients for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Build the chat model named by `config.llm` on `config.llm_provider`.
pub fn init_chat_model(config: &Config) -> Result<Box<dyn ChatModel>, ProviderError> {
    let provider: Provider = config.llm_provider.parse()?;
    let timeout = config.request_timeout()?;

    info!(
        "Initializing chat model: provider={:?}, model={}",
        provider, config.llm
    );

    match provider {
        Provider::Ollama => Ok(Box::new(
            OllamaChatModel::new(config.llm.clone(), timeout)?
                .with_base_url(config.ollama_base_url.clone()),
        )),
    }
}
