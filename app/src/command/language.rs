use parley_conversation::{ChatPromptTemplate, ConversationManager, ModelNode, TurnContext};
use parley_core::ThreadId;
use tracing::{Instrument, info};

use super::DemoInput;
use crate::logging;

pub const LANGUAGE_PROMPT: &str = "You are a helpful assistant. Answer all questions to the best of your ability in {language}.";

/// A per-thread reply language rendered into the system prompt.
///
/// The language is sent on the first turn only; later turns on the same
/// thread reuse the stored value.
#[derive(Debug, Clone, Copy)]
pub struct LanguageStrategy;

impl super::CommandStrategy for LanguageStrategy {
    type Input = DemoInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        async move {
            let node = ModelNode::new(input.model)
                .with_prompt(ChatPromptTemplate::new(LANGUAGE_PROMPT)?);
            let manager = ConversationManager::in_memory(node)?;
            let thread = ThreadId::from("abc456");

            let first = manager
                .process_turn(
                    &thread,
                    TurnContext::new("Hi! I'm Bob").with_language("italian"),
                )
                .await?;
            info!("Response: {}", first.response);

            let second = manager
                .process_turn(&thread, TurnContext::new("What's my name?"))
                .await?;
            info!(
                "Response (language still {:?}): {}",
                second.state.language, second.response
            );

            anyhow::Ok(())
        }
        .instrument(logging::component("language_chat"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::CommandStrategy;
    use super::super::testing::RecordingModel;
    use super::*;
    use parley_core::Role;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_language_reused_on_second_turn() {
        let model = Arc::new(RecordingModel::default());
        LanguageStrategy
            .execute(DemoInput {
                model: model.clone(),
            })
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(call[0].role, Role::System);
            assert!(call[0].content.ends_with("in italian."));
        }
        assert_eq!(calls[1].len(), 4);
    }
}
