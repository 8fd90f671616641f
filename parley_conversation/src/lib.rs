#![warn(
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

//! Multi-turn conversation support on top of the checkpointed graph runtime.
//!
//! # Key Features
//! - Per-thread message history that is only ever appended to
//! - A per-thread reply language rendered into the system prompt
//! - Token-budgeted trimming of the history sent to the model

mod manager;
mod node;
mod prompt;
mod state;
mod trim;

pub use manager::{
    ConversationError, ConversationGraph, ConversationManager, MODEL_NODE, TurnContext,
    TurnResult, build_conversation,
};
pub use node::ModelNode;
pub use prompt::{ChatPromptTemplate, PromptError, PromptVariables};
pub use state::{ConversationState, StateUpdate};
pub use trim::{
    ApproxTokenCounter, MessageCounter, MessageTrimmer, TokenCounter, TrimPolicy, TrimStrategy,
    trim_messages,
};
