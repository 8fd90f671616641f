use parley_config::Config;

/// Strategy for displaying the effective configuration.
///
/// Prints every setting after environment overrides and defaults are
/// applied. Does not contact the model.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        println!("=== parley Configuration ===\n");
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!();
        println!("Request timeout: {:?}", config.request_timeout()?);
        Ok(())
    }
}
