use std::sync::Arc;

use parley_conversation::{
    ConversationManager, ConversationState, ModelNode, TurnContext, build_conversation,
};
use parley_core::ThreadId;
use parley_graph::{Checkpointer, InMemoryCheckpointer};
use tracing::{Instrument, info};

use super::DemoInput;
use crate::logging;

/// Memory through a checkpointed single-node graph.
///
/// Turns on the same thread id see the whole thread history; a new thread id
/// starts from nothing.
#[derive(Debug, Clone, Copy)]
pub struct StatefulStrategy;

impl super::CommandStrategy for StatefulStrategy {
    type Input = DemoInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        async move {
            let checkpointer: Arc<dyn Checkpointer<ConversationState>> =
                Arc::new(InMemoryCheckpointer::new());
            let graph = build_conversation(ModelNode::new(input.model), checkpointer)?;
            let manager = ConversationManager::new(graph);

            let bob = ThreadId::from("abc123");
            let stranger = ThreadId::from("abc234");

            for (thread, text) in [
                (&bob, "Hi! I'm Bob"),
                (&bob, "What's my name?"),
                (&stranger, "What's my name?"),
                (&bob, "What's my name?"),
            ] {
                let turn = manager.process_turn(thread, TurnContext::new(text)).await?;
                info!("[{thread}] Prompt: {text}");
                info!(
                    "[{thread}] Response (turn {}): {}",
                    turn.turn_number, turn.response
                );
            }

            anyhow::Ok(())
        }
        .instrument(logging::component("stateful_chat"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::CommandStrategy;
    use super::super::testing::RecordingModel;
    use super::*;
    use parley_core::ChatMessage;

    #[tokio::test]
    async fn test_history_follows_thread_id() {
        let model = Arc::new(RecordingModel::default());
        StatefulStrategy
            .execute(DemoInput {
                model: model.clone(),
            })
            .await
            .unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].len(), 3);
        assert_eq!(calls[2], vec![ChatMessage::user("What's my name?")]);
        // back on the first thread: two earlier turns plus the new question
        assert_eq!(calls[3].len(), 5);
        assert_eq!(calls[3][0], ChatMessage::user("Hi! I'm Bob"));
    }
}
