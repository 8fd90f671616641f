//! Process-wide logging setup.
//!
//! Three sinks: the console at the configured level, `app.log` at the same
//! level and `error.log` for errors only. Both files go through a
//! non-blocking writer over a size-rotating file.

use std::fs;
use std::path::Path;

use chrono::TimeDelta;
use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};
use parley_config::Config;
use thiserror::Error;
use tracing::{Span, Subscriber, info_span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Cannot open log file")]
    Io(#[from] std::io::Error),

    #[error("Logger already initialized")]
    Init(#[from] TryInitError),
}

/// When log files rotate and how long rotated files are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: usize,
    pub max_age: TimeDelta,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_age: TimeDelta::days(30),
        }
    }
}

/// Keeps the background log writers alive; dropping it flushes them.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
pub fn init(config: &Config) -> Result<LoggingGuard, LoggingError> {
    let (subscriber, guard) = subscriber(config, RotationPolicy::default())?;
    subscriber.try_init()?;
    Ok(guard)
}

/// A span that tags every record emitted inside it with `component`.
#[must_use]
pub fn component(name: &'static str) -> Span {
    info_span!("component", component = name)
}

/// Map a level name to a filter, accepting the common aliases.
pub fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::WARN),
        "CRITICAL" | "FATAL" => Ok(LevelFilter::ERROR),
        "SUCCESS" => Ok(LevelFilter::INFO),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| LoggingError::InvalidLevel(raw.to_string())),
    }
}

fn subscriber(
    config: &Config,
    rotation: RotationPolicy,
) -> Result<(impl Subscriber + Send + Sync + 'static, LoggingGuard), LoggingError> {
    let level = parse_level(&config.log_level)?;
    let console_level = if config.debug {
        level.max(LevelFilter::DEBUG)
    } else {
        level
    };

    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();

    fs::create_dir_all(&config.log_dir)?;
    let (app_writer, app_guard) =
        tracing_appender::non_blocking(rotating_file(&config.log_dir, "app.log", rotation));
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(rotating_file(&config.log_dir, "error.log", rotation));

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(app_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(level),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(error_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::ERROR),
        );

    Ok((
        subscriber,
        LoggingGuard {
            _guards: vec![app_guard, error_guard],
        },
    ))
}

/// `<dir>/<name>`, rotated once it has grown past `max_bytes`.
///
/// Rotated files get a timestamp suffix (`app.log.20261019T140322`) and are
/// removed once older than `max_age`. A record is never split across files.
fn rotating_file(dir: &Path, name: &str, policy: RotationPolicy) -> FileRotate<AppendTimestamp> {
    FileRotate::new(
        dir.join(name),
        AppendTimestamp::default(FileLimit::Age(policy.max_age)),
        ContentLimit::BytesSurpassed(policy.max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing::{debug, error, info};

    #[test]
    fn test_parse_level_aliases() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("CRITICAL").unwrap(), LevelFilter::ERROR);
        assert!(matches!(
            parse_level("chatty"),
            Err(LoggingError::InvalidLevel(ref l)) if l == "chatty"
        ));
    }

    #[test]
    fn test_file_sinks_split_by_level() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            log_dir: dir.path().to_path_buf(),
            log_level: "INFO".to_string(),
            ..Config::default()
        };

        let (subscriber, guard) = subscriber(&config, RotationPolicy::default()).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            let _span = component("stateful_chat").entered();
            debug!("not recorded");
            info!("conversation started");
            error!("model unreachable");
        });
        drop(guard);

        let app = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(app.contains("conversation started"));
        assert!(app.contains("model unreachable"));
        assert!(app.contains("stateful_chat"));
        assert!(app.contains("src/logging/mod.rs:"));
        assert!(!app.contains("not recorded"));

        let errors = fs::read_to_string(dir.path().join("error.log")).unwrap();
        assert!(errors.contains("model unreachable"));
        assert!(!errors.contains("conversation started"));
    }

    #[test]
    fn test_invalid_level_is_rejected_before_files_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            log_dir: dir.path().join("logs"),
            log_level: "loud".to_string(),
            ..Config::default()
        };

        assert!(matches!(
            subscriber(&config, RotationPolicy::default()),
            Err(LoggingError::InvalidLevel(_))
        ));
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_file_rotates_past_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RotationPolicy {
            max_bytes: 50,
            ..RotationPolicy::default()
        };
        let mut log = rotating_file(dir.path(), "app.log", policy);

        // 41 bytes, then 12 more to pass the limit; the third write rotates
        for line in [
            "first line of forty bytes...............\n",
            "second line\n",
            "third line\n",
        ] {
            log.write_all(line.as_bytes()).unwrap();
        }
        log.flush().unwrap();

        let rotated: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("app.log."))
            .collect();
        assert_eq!(rotated.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(&rotated[0])).unwrap(),
            "first line of forty bytes...............\nsecond line\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log")).unwrap(),
            "third line\n"
        );
    }
}
