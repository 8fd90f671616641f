#![deny(
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

//! A small checkpointed state-graph runtime.
//!
//! A graph is a linear chain of nodes between the [`START`] and [`END`]
//! markers. Each invocation is scoped to a thread: the latest checkpoint for
//! that thread is loaded, the caller's input is merged into it, every node
//! runs in order and merges its own update, and the result is saved as the
//! next checkpoint.
//!
//! ```text
//! StateGraph ─► compile(checkpointer) ─► CompiledGraph::invoke(input, thread)
//!                                           │
//!                                           ├─► Checkpointer::get ─► S::apply(input)
//!                                           ├─► Node::run ─► S::apply(update)   (per node)
//!                                           └─► Checkpointer::put
//! ```

mod checkpoint;
mod graph;
mod node;

pub use checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};
pub use graph::{CompiledGraph, RunConfig, StateGraph};
pub use node::{GraphState, Node};

use thiserror::Error;

/// Entry marker for edges.
pub const START: &str = "__start__";
/// Exit marker for edges.
pub const END: &str = "__end__";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph has no nodes")]
    Empty,

    #[error("Node name is reserved: {0}")]
    ReservedName(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Edge references unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid edge {from} -> {to}")]
    InvalidEdge { from: String, to: String },

    #[error("Node {0} has more than one outgoing edge")]
    Branching(String),

    #[error("Node {0} has no outgoing edge")]
    DeadEnd(String),

    #[error("Cycle detected at node {0}")]
    Cycle(String),

    #[error("Node {0} is not reachable from start")]
    Unreachable(String),

    #[error("Node {name} failed")]
    Node {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Checkpoint store error")]
    Checkpoint(#[source] anyhow::Error),
}
