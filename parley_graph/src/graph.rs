use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parley_core::ThreadId;
use tracing::{debug, info};

use crate::{Checkpoint, Checkpointer, END, GraphError, GraphState, Node, START};

/// Per-invocation settings. Every invocation is scoped to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub thread_id: ThreadId,
}

impl RunConfig {
    pub fn new(thread_id: impl Into<ThreadId>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }
}

/// Builder for a graph of named nodes.
pub struct StateGraph<S: GraphState> {
    nodes: Vec<(String, Arc<dyn Node<S>>)>,
    edges: Vec<(String, String)>,
}

impl<S: GraphState> StateGraph<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_node(mut self, name: impl Into<String>, node: impl Node<S> + 'static) -> Self {
        self.nodes.push((name.into(), Arc::new(node)));
        self
    }

    #[must_use]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validate the graph and bind it to a checkpoint store.
    ///
    /// The graph must form a single acyclic path from [`START`] to [`END`]
    /// that visits every node.
    pub fn compile(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledGraph<S>, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut by_name: HashMap<&str, Arc<dyn Node<S>>> = HashMap::new();
        for (name, node) in &self.nodes {
            if name == START || name == END {
                return Err(GraphError::ReservedName(name.clone()));
            }
            if by_name.insert(name.as_str(), Arc::clone(node)).is_some() {
                return Err(GraphError::DuplicateNode(name.clone()));
            }
        }

        let mut next: HashMap<&str, &str> = HashMap::new();
        for (from, to) in &self.edges {
            if from == END || to == START {
                return Err(GraphError::InvalidEdge {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            for endpoint in [from, to] {
                if endpoint != START && endpoint != END && !by_name.contains_key(endpoint.as_str())
                {
                    return Err(GraphError::UnknownNode(endpoint.clone()));
                }
            }
            if next.insert(from.as_str(), to.as_str()).is_some() {
                return Err(GraphError::Branching(from.clone()));
            }
        }

        let mut steps = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut current = START;
        loop {
            let Some(&to) = next.get(current) else {
                return Err(GraphError::DeadEnd(current.to_string()));
            };
            if to == END {
                break;
            }
            if !visited.insert(to) {
                return Err(GraphError::Cycle(to.to_string()));
            }
            steps.push((to.to_string(), Arc::clone(&by_name[to])));
            current = to;
        }

        if let Some((name, _)) = self
            .nodes
            .iter()
            .find(|(name, _)| !visited.contains(name.as_str()))
        {
            return Err(GraphError::Unreachable(name.clone()));
        }

        info!(
            "Compiled graph: {}",
            steps
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(CompiledGraph {
            steps,
            checkpointer,
        })
    }
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// An executable graph backed by a checkpoint store.
pub struct CompiledGraph<S: GraphState> {
    steps: Vec<(String, Arc<dyn Node<S>>)>,
    checkpointer: Arc<dyn Checkpointer<S>>,
}

impl<S: GraphState> CompiledGraph<S> {
    /// Run the graph once on the given thread and return its full updated state.
    ///
    /// A thread id with no checkpoint starts from `S::default()`. If any node
    /// fails, nothing is saved and the thread keeps its previous checkpoint.
    pub async fn invoke(&self, input: S::Update, config: &RunConfig) -> Result<S, GraphError> {
        let thread_id = &config.thread_id;
        let (mut state, step) = self
            .load(thread_id)
            .await?
            .map_or_else(|| (S::default(), 0), |c| (c.state, c.step));

        debug!("Invoking graph: thread={thread_id}, step={}", step + 1);
        state.apply(input);

        for (name, node) in &self.steps {
            debug!("Running node {name}");
            let update = node
                .run(&state)
                .await
                .map_err(|source| GraphError::Node {
                    name: name.clone(),
                    source,
                })?;
            state.apply(update);
        }

        self.checkpointer
            .put(Checkpoint::new(thread_id.clone(), state.clone(), step + 1))
            .await
            .map_err(GraphError::Checkpoint)?;

        Ok(state)
    }

    /// Latest saved state of a thread.
    pub async fn get_state(&self, thread_id: &ThreadId) -> Result<Option<S>, GraphError> {
        Ok(self.load(thread_id).await?.map(|c| c.state))
    }

    /// Merge an update into a thread's state without running any node.
    pub async fn update_state(
        &self,
        thread_id: &ThreadId,
        update: S::Update,
    ) -> Result<S, GraphError> {
        let (mut state, step) = self
            .load(thread_id)
            .await?
            .map_or_else(|| (S::default(), 0), |c| (c.state, c.step));
        state.apply(update);

        self.checkpointer
            .put(Checkpoint::new(thread_id.clone(), state.clone(), step + 1))
            .await
            .map_err(GraphError::Checkpoint)?;

        Ok(state)
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Checkpoint<S>>, GraphError> {
        self.checkpointer
            .get(thread_id)
            .await
            .map_err(GraphError::Checkpoint)
    }
}
