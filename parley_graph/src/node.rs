use async_trait::async_trait;

/// State carried through a graph and persisted per thread.
///
/// `apply` is the merge rule: both the caller's input and every node's
/// output are folded into the state through it.
pub trait GraphState: Clone + Default + Send + Sync + 'static {
    type Update: Send + 'static;

    fn apply(&mut self, update: Self::Update);
}

/// One processing step of a graph.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    async fn run(&self, state: &S) -> anyhow::Result<S::Update>;
}
