use std::sync::Arc;

use parley_conversation::{
    ApproxTokenCounter, ChatPromptTemplate, ConversationManager, MessageTrimmer, ModelNode,
    TrimPolicy, TurnContext,
};
use parley_core::{ChatMessage, ThreadId};
use tracing::{Instrument, info};

use super::DemoInput;
use super::language::LANGUAGE_PROMPT;
use crate::logging;

/// Token budget for everything forwarded to the model, system prompt included.
pub const MAX_HISTORY_TOKENS: usize = 65;

/// History keeps growing in storage; each call only forwards what fits.
#[derive(Debug, Clone, Copy)]
pub struct TrimmedStrategy;

fn seeded_history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("hi! I'm bob"),
        ChatMessage::assistant("hi!"),
        ChatMessage::user("I like vanilla ice cream"),
        ChatMessage::assistant("nice"),
        ChatMessage::user("whats 2 + 2"),
        ChatMessage::assistant("4"),
        ChatMessage::user("thanks"),
        ChatMessage::assistant("no problem!"),
        ChatMessage::user("having fun?"),
        ChatMessage::assistant("yes!"),
    ]
}

impl super::CommandStrategy for TrimmedStrategy {
    type Input = DemoInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        async move {
            let trimmer = MessageTrimmer::new(
                TrimPolicy::default().with_max_tokens(MAX_HISTORY_TOKENS),
                Arc::new(ApproxTokenCounter::default()),
            );
            info!("Trim policy: {:?}", trimmer.policy());

            let node = ModelNode::new(input.model)
                .with_prompt(ChatPromptTemplate::new(LANGUAGE_PROMPT)?)
                .with_trimmer(trimmer);
            let manager = ConversationManager::in_memory(node)?;
            let thread = ThreadId::new();
            manager.seed(&thread, seeded_history()).await?;

            let turns = [
                ("What's my name?", Some("english")),
                ("What math problem did I ask?", None),
            ];
            for (question, language) in turns {
                let mut context = TurnContext::new(question);
                if let Some(language) = language {
                    context = context.with_language(language);
                }
                let turn = manager.process_turn(&thread, context).await?;
                info!("Prompt: {question}");
                info!(
                    "Response: {} ({} messages stored)",
                    turn.response,
                    turn.state.message_count()
                );
            }

            anyhow::Ok(())
        }
        .instrument(logging::component("trimmed_chat"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::CommandStrategy;
    use super::super::testing::RecordingModel;
    use super::*;
    use parley_conversation::TokenCounter;
    use parley_core::Role;

    #[tokio::test]
    async fn test_model_sees_bounded_history() {
        let model = Arc::new(RecordingModel::default());
        TrimmedStrategy
            .execute(DemoInput {
                model: model.clone(),
            })
            .await
            .unwrap();

        let counter = ApproxTokenCounter::default();
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(call[0].role, Role::System);
            assert!(call[0].content.ends_with("in english."));
            assert!(counter.count_all(call) <= MAX_HISTORY_TOKENS);
            assert!(call.len() < seeded_history().len());
            assert!(!call.contains(&ChatMessage::user("hi! I'm bob")));
        }
        assert_eq!(calls[0].last(), Some(&ChatMessage::user("What's my name?")));
        assert_eq!(
            calls[1].last(),
            Some(&ChatMessage::user("What math problem did I ask?"))
        );
    }
}
