//! `.env` file support.
//!
//! Values from the file are copied into the process environment before
//! [`Config::from_env`](crate::Config::from_env) runs. Variables that are
//! already set keep their values.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ConfigError;

/// Load the first `.env` found in the working directory or its parents.
///
/// Returns the file that was loaded, or `None` when there is none.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Loaded environment file {}", path.display());
            Ok(Some(path))
        }
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load a specific env file. A missing file is not an error.
pub fn load_dotenv_from(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!("Loaded environment file {}", path.display());
            Ok(true)
        }
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
