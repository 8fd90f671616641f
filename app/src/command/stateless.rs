use parley_core::ChatMessage;
use tracing::{Instrument, info};

use super::DemoInput;
use crate::logging;

/// The model on its own has no memory.
///
/// Each call only sees the messages passed to it, so a name given in one
/// call is unknown in the next. Passing the earlier turns back in by hand is
/// what makes the model "remember".
#[derive(Debug, Clone, Copy)]
pub struct StatelessStrategy;

impl super::CommandStrategy for StatelessStrategy {
    type Input = DemoInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let model = input.model;

        async move {
            let hi_im_bob = ChatMessage::user("Hi! I'm Bob");
            let response_hi_bob = model.invoke(std::slice::from_ref(&hi_im_bob)).await?;
            info!("Prompt: {hi_im_bob}");
            info!("Response: {}", response_hi_bob.content);

            let whats_my_name = ChatMessage::user("What's my name?");
            let response_name = model.invoke(std::slice::from_ref(&whats_my_name)).await?;
            info!("Prompt: {whats_my_name}");
            info!("Response: {}", response_name.content);

            info!("----------------------");

            let prompts = vec![
                hi_im_bob,
                response_hi_bob.into_message(),
                whats_my_name,
            ];
            let response_with_context = model.invoke(&prompts).await?;
            info!("Prompts: {prompts:?}");
            info!("Response: {}", response_with_context.content);

            anyhow::Ok(())
        }
        .instrument(logging::component("stateless_chat"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::CommandStrategy;
    use super::super::testing::RecordingModel;
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_only_the_last_call_carries_history() {
        let model = Arc::new(RecordingModel::default());
        StatelessStrategy
            .execute(DemoInput {
                model: model.clone(),
            })
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], vec![ChatMessage::user("Hi! I'm Bob")]);
        assert_eq!(calls[1], vec![ChatMessage::user("What's my name?")]);
        assert_eq!(
            calls[2],
            vec![
                ChatMessage::user("Hi! I'm Bob"),
                ChatMessage::assistant("reply 1"),
                ChatMessage::user("What's my name?"),
            ]
        );
    }
}
