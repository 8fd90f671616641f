//! Environment-derived application configuration.
//!
//! The configuration is read once at startup and then passed by reference to
//! every component that needs it. Nothing here is global apart from the
//! process environment, which an optional `.env` file may extend first.

mod dotenv;
mod schema;

pub use dotenv::{load_dotenv, load_dotenv_from};
pub use schema::{Config, DocumentSettings, parse_flag};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot load environment file")]
    Dotenv(#[from] dotenvy::Error),
}
