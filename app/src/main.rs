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

mod command;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, DemoInput, InfoStrategy, LanguageStrategy, StatefulStrategy,
    StatelessStrategy, TrimmedStrategy, VersionStrategy, run_all_demos,
};
use parley_config::{Config, load_dotenv, load_dotenv_from};
use parley_providers::init_chat_model;
use tracing::{Instrument, error, info};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Stateful chat demos against a local model", long_about = None)]
struct Cli {
    /// Environment file to load instead of searching for `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Scenario to run; all demos run in order when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Single calls with no memory between them
    Stateless,
    /// Per-thread memory through the checkpointed graph
    Stateful,
    /// Per-thread reply language in the system prompt
    Language,
    /// History trimmed to a token budget before each call
    Trimmed,
    /// Show the effective configuration
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_file = match &cli.env_file {
        Some(path) => load_dotenv_from(path)?.then(|| path.clone()),
        None => load_dotenv()?,
    };
    let config = Config::from_env()?;
    let _guard = logging::init(&config)?;
    if let Some(path) = env_file {
        info!("Environment loaded from {}", path.display());
    }

    run(cli, config)
        .instrument(logging::component("main"))
        .await
        .inspect_err(|e| error!("Run failed: {e:#}"))
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Info) => InfoStrategy.execute(config).await,
        Some(Commands::Version) => VersionStrategy.execute(()).await,
        None => run_all_demos(demo_input(&config)?).await,
        Some(Commands::Stateless) => StatelessStrategy.execute(demo_input(&config)?).await,
        Some(Commands::Stateful) => StatefulStrategy.execute(demo_input(&config)?).await,
        Some(Commands::Language) => LanguageStrategy.execute(demo_input(&config)?).await,
        Some(Commands::Trimmed) => TrimmedStrategy.execute(demo_input(&config)?).await,
    }
}

/// The chat model every demo talks to, built from `config`.
fn demo_input(config: &Config) -> anyhow::Result<DemoInput> {
    info!("Application started in {} mode", config.app_mode);
    let model = init_chat_model(config)?;
    Ok(DemoInput {
        model: Arc::from(model),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::ChatModel;

    #[test]
    fn test_no_subcommand_runs_everything() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.env_file.is_none());

        let cli = Cli::try_parse_from(["parley", "trimmed", "--env-file", "local.env"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Trimmed)));
        assert_eq!(cli.env_file, Some(PathBuf::from("local.env")));
    }

    #[test]
    fn test_demo_input_uses_configured_model() {
        let config = Config {
            llm: "mistral".to_string(),
            ..Config::default()
        };
        let input = demo_input(&config).unwrap();
        assert_eq!(input.model.model_name(), "mistral");
    }

    #[test]
    fn test_demo_input_rejects_unknown_provider() {
        let config = Config {
            llm_provider: "openai".to_string(),
            ..Config::default()
        };
        let err = demo_input(&config).err().unwrap();
        assert!(err.to_string().contains("openai"));
    }

    #[tokio::test]
    async fn test_info_runs_without_a_model() {
        let cli = Cli::try_parse_from(["parley", "info"]).unwrap();
        let config = Config {
            llm_provider: "unreachable".to_string(),
            ..Config::default()
        };
        run(cli, config).await.unwrap();
    }
}
