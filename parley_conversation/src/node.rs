use std::sync::Arc;

use async_trait::async_trait;
use parley_core::{ChatMessage, ChatModel};
use parley_graph::Node;
use tracing::{debug, info};

use crate::prompt::{ChatPromptTemplate, PromptError, PromptVariables};
use crate::state::{ConversationState, StateUpdate};
use crate::trim::MessageTrimmer;

/// The graph node that calls the chat model.
///
/// Dependencies are fixed at construction; the node itself holds no
/// conversation state. On each run it prepends the rendered system prompt (if
/// a template is set), trims the result (if a trimmer is set) and returns the
/// model's reply as a single appended message.
pub struct ModelNode {
    model: Arc<dyn ChatModel>,
    prompt: Option<ChatPromptTemplate>,
    trimmer: Option<MessageTrimmer>,
}

impl ModelNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prompt: None,
            trimmer: None,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: ChatPromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    #[must_use]
    pub fn with_trimmer(mut self, trimmer: MessageTrimmer) -> Self {
        self.trimmer = Some(trimmer);
        self
    }

    /// The exact message sequence the model will receive for `state`.
    ///
    /// The prompt is rendered over the full history first, so the trimmer
    /// sees the template's system message as the leading message: with
    /// `include_system` it is kept and its cost counts toward the budget.
    pub fn prepare(&self, state: &ConversationState) -> Result<Vec<ChatMessage>, PromptError> {
        let messages = match &self.prompt {
            Some(prompt) => {
                let mut variables = PromptVariables::new();
                if let Some(language) = state.language.as_deref() {
                    variables.insert("language", language);
                }
                prompt.render(&variables, state.messages.clone())?
            }
            None => state.messages.clone(),
        };

        Ok(match &self.trimmer {
            Some(trimmer) => trimmer.trim(&messages),
            None => messages,
        })
    }
}

#[async_trait]
impl Node<ConversationState> for ModelNode {
    async fn run(&self, state: &ConversationState) -> anyhow::Result<StateUpdate> {
        let messages = self.prepare(state)?;

        info!(
            "Calling {} with {} of {} stored messages",
            self.model.model_name(),
            messages.len(),
            state.message_count()
        );
        for (i, msg) in messages.iter().enumerate() {
            debug!(
                "Message {}: role={}, content_len={}",
                i,
                msg.role,
                msg.content.len()
            );
        }

        let response = self.model.invoke(&messages).await?;
        Ok(StateUpdate::message(response.into_message()))
    }
}
