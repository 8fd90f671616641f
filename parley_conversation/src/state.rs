//! Per-thread conversation state.
//!
//! The state is what the checkpoint store keeps for each thread: the full
//! message history plus the language the assistant should answer in.

use parley_core::{ChatMessage, Role};
use parley_graph::GraphState;

/// Everything persisted for one conversation thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Message history, oldest first. Only ever appended to.
    pub messages: Vec<ChatMessage>,
    /// Reply language. Kept until a later update sets a new one.
    pub language: Option<String>,
}

impl ConversationState {
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Get all user messages.
    #[must_use]
    pub fn user_messages(&self) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .collect()
    }

    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// A change to merge into [`ConversationState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub messages: Vec<ChatMessage>,
    pub language: Option<String>,
}

impl StateUpdate {
    #[must_use]
    pub fn message(message: ChatMessage) -> Self {
        Self {
            messages: vec![message],
            language: None,
        }
    }

    #[must_use]
    pub const fn messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl GraphState for ConversationState {
    type Update = StateUpdate;

    fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(language) = update.language {
            self.language = Some(language);
        }
    }
}
