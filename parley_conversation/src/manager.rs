//! Conversation manager for multi-turn dialogue.
//!
//! The `ConversationManager` wraps a single-node graph (`START -> model ->
//! END`) and turns user input into per-thread turns.

use std::sync::Arc;

use parley_core::{ChatMessage, Role, ThreadId};
use parley_graph::{
    Checkpointer, CompiledGraph, END, GraphError, InMemoryCheckpointer, RunConfig, START,
    StateGraph,
};
use thiserror::Error;
use tracing::info;

use crate::node::ModelNode;
use crate::state::{ConversationState, StateUpdate};

/// Name of the node that calls the model.
pub const MODEL_NODE: &str = "model";

pub type ConversationGraph = CompiledGraph<ConversationState>;

/// Errors that can occur during conversation management.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Model produced no assistant message for thread {0}")]
    EmptyResponse(ThreadId),
}

/// Compile `START -> model -> END` over the given checkpoint store.
pub fn build_conversation(
    node: ModelNode,
    checkpointer: Arc<dyn Checkpointer<ConversationState>>,
) -> Result<ConversationGraph, GraphError> {
    StateGraph::new()
        .add_node(MODEL_NODE, node)
        .add_edge(START, MODEL_NODE)
        .add_edge(MODEL_NODE, END)
        .compile(checkpointer)
}

/// Input for a single conversation turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Messages to append before the model runs, usually one user message.
    pub messages: Vec<ChatMessage>,
    /// Reply language; `None` keeps whatever the thread already has.
    pub language: Option<String>,
}

impl TurnContext {
    #[must_use]
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(user_input)],
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl From<TurnContext> for StateUpdate {
    fn from(context: TurnContext) -> Self {
        Self {
            messages: context.messages,
            language: context.language,
        }
    }
}

/// Result of processing a conversation turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Assistant's response
    pub response: String,
    /// Full thread state after the turn
    pub state: ConversationState,
    /// 1-based count of user messages in the thread
    pub turn_number: usize,
}

/// Multi-turn conversation manager.
pub struct ConversationManager {
    graph: ConversationGraph,
}

impl ConversationManager {
    #[must_use]
    pub const fn new(graph: ConversationGraph) -> Self {
        Self { graph }
    }

    /// A manager backed by a fresh in-memory checkpoint store.
    pub fn in_memory(node: ModelNode) -> Result<Self, GraphError> {
        let checkpointer: Arc<dyn Checkpointer<ConversationState>> =
            Arc::new(InMemoryCheckpointer::new());
        Ok(Self::new(build_conversation(node, checkpointer)?))
    }

    /// Run one turn on `thread_id`. An unseen thread id starts a new, empty thread.
    pub async fn process_turn(
        &self,
        thread_id: &ThreadId,
        context: TurnContext,
    ) -> Result<TurnResult, ConversationError> {
        info!("Processing turn for thread: {thread_id}");

        let state = self
            .graph
            .invoke(context.into(), &RunConfig::new(thread_id.clone()))
            .await?;

        let response = state
            .last_message()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.clone())
            .ok_or_else(|| ConversationError::EmptyResponse(thread_id.clone()))?;
        let turn_number = state.user_messages().len();

        Ok(TurnResult {
            response,
            state,
            turn_number,
        })
    }

    /// Saved state of a thread, without running the model.
    pub async fn state(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ConversationState>, ConversationError> {
        Ok(self.graph.get_state(thread_id).await?)
    }

    /// Append history to a thread without calling the model.
    pub async fn seed(
        &self,
        thread_id: &ThreadId,
        messages: Vec<ChatMessage>,
    ) -> Result<ConversationState, ConversationError> {
        Ok(self
            .graph
            .update_state(thread_id, StateUpdate::messages(messages))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_context() {
        let ctx = TurnContext::new("Hello").with_language("italian");
        assert_eq!(ctx.messages, vec![ChatMessage::user("Hello")]);
        assert_eq!(ctx.language.as_deref(), Some("italian"));

        let update = StateUpdate::from(ctx);
        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.language.as_deref(), Some("italian"));
    }

    #[test]
    fn test_turn_context_without_language() {
        let update: StateUpdate = TurnContext::new("a").into();
        assert_eq!(update.messages, vec![ChatMessage::user("a")]);
        assert!(update.language.is_none());
    }
}
