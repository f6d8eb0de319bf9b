//! Graph node trait.

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// One step of a graph: state in, state out, plus where to go next.
///
/// **Interaction**: Registered with `StateGraph::add_node`; run by
/// `CompiledStateGraph::invoke`, optionally wrapped by a `NodeMiddleware`.
#[async_trait]
pub trait Node<S>: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
