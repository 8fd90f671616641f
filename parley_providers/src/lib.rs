#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Chat model clients, resolved by provider name.

mod ollama;
mod registry;

pub use ollama::{OLLAMA_BASE_URL, OllamaChatModel};
pub use registry::{Provider, init_chat_model};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Config(#[from] parley_config::ConfigError),
}
