//! Static strategy pattern for CLI commands.
//!
//! Each command is its own strategy type with its own input, dispatched
//! statically from `main`. The demo strategies share one input: the chat
//! model every scenario talks to.

use parley_core::ChatModel;
use std::sync::Arc;
use tracing::info;

mod info;
mod language;
mod stateful;
mod stateless;
mod trimmed;
mod version;

pub use info::InfoStrategy;
pub use language::LanguageStrategy;
pub use stateful::StatefulStrategy;
pub use stateless::StatelessStrategy;
pub use trimmed::TrimmedStrategy;
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails. Model failures are not
    /// caught; they end the run.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Input shared by the demo scenarios.
#[derive(Clone)]
pub struct DemoInput {
    pub model: Arc<dyn ChatModel>,
}

/// Run every demo scenario in order, stopping at the first failure.
pub async fn run_all_demos(input: DemoInput) -> anyhow::Result<()> {
    StatelessStrategy.execute(input.clone()).await?;
    StatefulStrategy.execute(input.clone()).await?;
    LanguageStrategy.execute(input.clone()).await?;
    TrimmedStrategy.execute(input).await?;
    info!("All demos finished");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use parley_core::{ChatMessage, ChatModel, LLMResponse};
    use std::sync::Mutex;

    /// Replies "reply N" and records every prompt it was sent.
    #[derive(Default)]
    pub struct RecordingModel {
        pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingModel {
        pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn invoke(&self, messages: &[ChatMessage]) -> anyhow::Result<LLMResponse> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            Ok(LLMResponse {
                content: format!("reply {}", calls.len()),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingModel;
    use super::*;

    #[tokio::test]
    async fn test_all_demos_run_against_one_model() {
        let model = Arc::new(RecordingModel::default());
        run_all_demos(DemoInput {
            model: model.clone(),
        })
        .await
        .unwrap();

        // 3 stateless + 4 stateful + 2 language + 2 trimmed
        assert_eq!(model.calls().len(), 11);
    }
}
