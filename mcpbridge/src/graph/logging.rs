//! Node logging middleware.
//!
//! Logs node enter/exit with the chosen `Next` and elapsed time through `tracing`.

use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{Next, NodeMiddleware, NodeRunFn};

/// Logs every node run at debug level; errors at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNodeMiddleware;

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware
where
    S: Send + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError> {
        tracing::debug!(node_id = node_id, "node enter");
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok((_, next)) => {
                tracing::debug!(node_id = node_id, ?next, elapsed_ms, "node exit");
            }
            Err(e) => {
                tracing::warn!(node_id = node_id, error = %e, elapsed_ms, "node failed");
            }
        }
        result
    }
}
