//! Middleware wrapping every node run (logging, timing).

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// The wrapped node run, handed to [`NodeMiddleware::around_run`].
pub type NodeRunFn<S> = Box<
    dyn FnOnce(S) -> Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>> + Send,
>;

/// Wraps each node run. Implementations must call `inner` exactly once (or
/// return an error without running the node).
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync {
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError>;
}
