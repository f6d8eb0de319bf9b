//! Frozen graph produced by [`StateGraph::compile`](super::StateGraph::compile).
//!
//! `invoke` runs nodes starting from the head of the chain and follows the
//! [`Next`] each node returns. Every node run counts as one step; a run that
//! exceeds the recursion limit fails instead of looping forever.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;

use super::node_middleware::NodeMiddleware;
use super::{Next, Node};

/// Node steps allowed per invoke unless overridden.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) edge_order: Vec<String>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Send + Sync + 'static,
{
    /// Caps node steps per invoke. Zero is raised to one.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit.max(1);
        self
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Node ids in chain order.
    pub fn node_ids(&self) -> &[String] {
        &self.edge_order
    }

    /// Id of the node after `id` on the chain; `None` past the tail.
    fn successor_of(&self, id: &str) -> Result<Option<&String>, AgentError> {
        let pos = self
            .edge_order
            .iter()
            .position(|x| x == id)
            .ok_or_else(|| AgentError::ExecutionFailed(format!("node {} is not on the chain", id)))?;
        Ok(self.edge_order.get(pos + 1))
    }

    async fn step(&self, id: &str, state: S) -> Result<(S, Next), AgentError> {
        let node = self
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown node: {}", id)))?;
        let Some(middleware) = &self.middleware else {
            return node.run(state).await;
        };
        middleware
            .around_run(id, state, Box::new(move |s| Box::pin(async move { node.run(s).await })))
            .await
    }

    /// Runs the graph to completion on `state`.
    ///
    /// `Next::Continue` moves along the chain (ending after the tail),
    /// `Next::Node(id)` jumps, `Next::End` stops.
    pub async fn invoke(&self, mut state: S) -> Result<S, AgentError> {
        let mut current = self
            .edge_order
            .first()
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed("empty graph".into()))?;

        let mut steps = 0;
        while steps < self.recursion_limit {
            steps += 1;
            let (updated, next) = self.step(&current, state).await?;
            state = updated;
            current = match next {
                Next::End => return Ok(state),
                Next::Node(id) => id,
                Next::Continue => match self.successor_of(&current)? {
                    Some(id) => id.clone(),
                    None => return Ok(state),
                },
            };
        }
        Err(AgentError::RecursionLimit(self.recursion_limit))
    }
}
