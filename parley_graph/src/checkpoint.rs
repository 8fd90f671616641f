use std::collections::HashMap;

use async_trait::async_trait;
use parley_core::ThreadId;
use tokio::sync::RwLock;
use tracing::debug;

use crate::GraphState;

/// A saved snapshot of one thread's state.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub thread_id: ThreadId,
    pub state: S,
    /// Number of completed invocations on this thread.
    pub step: u64,
}

impl<S> Checkpoint<S> {
    pub fn new(thread_id: ThreadId, state: S, step: u64) -> Self {
        Self {
            thread_id,
            state,
            step,
        }
    }
}

/// Storage for per-thread checkpoints.
#[async_trait]
pub trait Checkpointer<S: GraphState>: Send + Sync {
    /// Latest checkpoint for the thread, or `None` for a thread never seen.
    async fn get(&self, thread_id: &ThreadId) -> anyhow::Result<Option<Checkpoint<S>>>;

    async fn put(&self, checkpoint: Checkpoint<S>) -> anyhow::Result<()>;

    async fn list_threads(&self) -> anyhow::Result<Vec<ThreadId>>;
}

/// Process-lifetime checkpoint store holding the latest checkpoint per thread.
///
/// A `put` replaces the thread's previous checkpoint, so memory is bounded by
/// the size of each thread's current state.
pub struct InMemoryCheckpointer<S> {
    threads: RwLock<HashMap<ThreadId, Checkpoint<S>>>,
}

impl<S> InMemoryCheckpointer<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> Default for InMemoryCheckpointer<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: GraphState> Checkpointer<S> for InMemoryCheckpointer<S> {
    async fn get(&self, thread_id: &ThreadId) -> anyhow::Result<Option<Checkpoint<S>>> {
        Ok(self
            .threads
            .read()
            .await
            .get(thread_id)
            .cloned())
    }

    async fn put(&self, checkpoint: Checkpoint<S>) -> anyhow::Result<()> {
        debug!(
            "Saving checkpoint: thread={}, step={}",
            checkpoint.thread_id, checkpoint.step
        );
        self.threads
            .write()
            .await
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn list_threads(&self) -> anyhow::Result<Vec<ThreadId>> {
        let mut ids: Vec<ThreadId> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
