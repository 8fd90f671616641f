use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::ConfigError;

/// Spellings accepted as `true` for boolean settings, compared case-insensitively.
const TRUTHY: [&str; 3] = ["true", "1", "t"];

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Config {
    pub app_mode: String,
    pub llm: String,
    pub llm_provider: String,
    pub llm_req_timeout_seconds: f64,
    pub ollama_base_url: String,
    pub debug: bool,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub documents: DocumentSettings,
}

/// Settings for document ingestion and vector search.
///
/// Not used by the chat flows; kept so one environment file serves both.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
    pub input_doc_folder: PathBuf,
    pub use_sample_docs: bool,
    pub doc_file_types: Vec<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub vector_store_doc_collection_name: String,
    pub embedding_model: String,
    pub reranker_model: String,
    pub db_host: String,
    pub db_port: u16,
    pub vector_dimension: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_mode: "development".to_string(),
            llm: "llama2".to_string(),
            llm_provider: "ollama".to_string(),
            llm_req_timeout_seconds: 120.0,
            ollama_base_url: "http://localhost:11434".to_string(),
            debug: false,
            log_level: "INFO".to_string(),
            log_dir: PathBuf::from("logs"),
            documents: DocumentSettings::default(),
        }
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            input_doc_folder: PathBuf::from("./data"),
            use_sample_docs: false,
            doc_file_types: vec![".pdf".to_string()],
            chunk_size: 1000,
            chunk_overlap: 200,
            vector_store_doc_collection_name: "semantic_search_docs".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            reranker_model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            db_host: "localhost".to_string(),
            db_port: 6333,
            vector_dimension: 1024,
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to their defaults. Present keys are coerced to
    /// the field type; numeric values that fail to parse are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Lookup(&lookup);

        let config = Self {
            app_mode: env
                .string("ENV")
                .or_else(|| env.string("APP_MODE"))
                .unwrap_or(defaults.app_mode),
            llm: env.string("LLM").unwrap_or(defaults.llm),
            llm_provider: env.string("LLM_PROVIDER").unwrap_or(defaults.llm_provider),
            llm_req_timeout_seconds: env
                .parsed("LLM_REQ_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.llm_req_timeout_seconds),
            ollama_base_url: env
                .string("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            debug: env.flag("DEBUG").unwrap_or(defaults.debug),
            log_level: env.string("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: env.string("LOG_DIR").map_or(defaults.log_dir, PathBuf::from),
            documents: DocumentSettings::from_lookup(&env)?,
        };

        debug!(
            "Configuration loaded: mode={}, provider={}, model={}",
            config.app_mode, config.llm_provider, config.llm
        );
        Ok(config)
    }

    /// The model request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.llm_req_timeout_seconds).map_err(|e| {
            ConfigError::Invalid {
                key: "LLM_REQ_TIMEOUT_SECONDS",
                value: self.llm_req_timeout_seconds.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl DocumentSettings {
    fn from_lookup<F>(env: &Lookup<'_, F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            input_doc_folder: env
                .string("INPUT_DOC_FOLDER")
                .map_or(defaults.input_doc_folder, PathBuf::from),
            use_sample_docs: env
                .flag("USE_SAMPLE_DOCS")
                .unwrap_or(defaults.use_sample_docs),
            doc_file_types: env
                .string("DOC_FILE_TYPES")
                .map_or(defaults.doc_file_types, |raw| {
                    raw.split(',').map(str::to_string).collect()
                }),
            chunk_size: env.parsed("CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            chunk_overlap: env
                .parsed("CHUNK_OVERLAP")?
                .unwrap_or(defaults.chunk_overlap),
            vector_store_doc_collection_name: env
                .string("VECTOR_STORE_DOC_COLLECTION_NAME")
                .unwrap_or(defaults.vector_store_doc_collection_name),
            embedding_model: env
                .string("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            reranker_model: env
                .string("RERANKER_MODEL")
                .unwrap_or(defaults.reranker_model),
            db_host: env.string("DB_HOST").unwrap_or(defaults.db_host),
            db_port: env.parsed("DB_PORT")?.unwrap_or(defaults.db_port),
            vector_dimension: env
                .parsed("VECTOR_DIMENSION")?
                .unwrap_or(defaults.vector_dimension),
        })
    }
}

/// Parse a boolean setting: `true`, `1` and `t` (any case) are true, anything else is false.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    TRUTHY.iter().any(|t| raw.eq_ignore_ascii_case(t))
}

struct Lookup<'a, F>(&'a F);

impl<F> Lookup<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.string(key).map(|raw| parse_flag(&raw))
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                    key,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.app_mode, "development");
        assert_eq!(config.llm, "llama2");
        assert_eq!(config.llm_provider, "ollama");
        assert!((config.llm_req_timeout_seconds - 120.0).abs() < f64::EPSILON);
        assert!(!config.debug);
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.documents, DocumentSettings::default());
        assert_eq!(config.documents.db_port, 6333);
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_truthy_spellings() {
        for raw in ["true", "TRUE", "True", "1", "t", "T"] {
            assert!(parse_flag(raw), "{raw:?} should be truthy");
        }
        for raw in ["false", "0", "yes", "on", "", "f", "tru", " true"] {
            assert!(!parse_flag(raw), "{raw:?} should be falsy");
        }
    }

    #[test]
    fn test_flags_read_from_environment() {
        let config = config_from(&[("DEBUG", "T"), ("USE_SAMPLE_DOCS", "nope")]).unwrap();
        assert!(config.debug);
        assert!(!config.documents.use_sample_docs);
    }

    #[test]
    fn test_env_takes_precedence_over_app_mode() {
        let config = config_from(&[("ENV", "production"), ("APP_MODE", "staging")]).unwrap();
        assert_eq!(config.app_mode, "production");

        let config = config_from(&[("APP_MODE", "staging")]).unwrap();
        assert_eq!(config.app_mode, "staging");
    }

    #[test]
    fn test_overrides_are_coerced() {
        let config = config_from(&[
            ("LLM", "llama3.2"),
            ("LLM_REQ_TIMEOUT_SECONDS", "7.5"),
            ("CHUNK_SIZE", "512"),
            ("DOC_FILE_TYPES", ".pdf,.md"),
        ])
        .unwrap();

        assert_eq!(config.llm, "llama3.2");
        assert_eq!(
            config.request_timeout().unwrap(),
            Duration::from_millis(7500)
        );
        assert_eq!(config.documents.chunk_size, 512);
        assert_eq!(config.documents.doc_file_types, vec![".pdf", ".md"]);
    }

    #[test]
    fn test_malformed_numbers_are_errors() {
        let err = config_from(&[("LLM_REQ_TIMEOUT_SECONDS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "LLM_REQ_TIMEOUT_SECONDS",
                ..
            }
        ));

        let err = config_from(&[("DB_PORT", "99999")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let config = config_from(&[("LLM_REQ_TIMEOUT_SECONDS", "-1")]).unwrap();
        assert!(config.request_timeout().is_err());
    }

    #[test]
    fn test_config_serializes_for_display() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["llm"], "llama2");
        assert_eq!(json["documents"]["chunk_overlap"], 200);
    }
}
