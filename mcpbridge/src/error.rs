//! Agent execution error types.
//!
//! Returned by graph nodes and the orchestrator for failures that end a turn.
//! Tool failures are not errors at this level: they are observations (see
//! [`InvocationResult`](crate::tools::InvocationResult)).

use thiserror::Error;

/// Turn-level error.
///
/// Only two conditions are fatal to a turn: the reasoning component cannot be
/// reached, or the tool source session is not Ready when the turn starts.
/// Everything else is recovered inside the loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The reasoning component (LLM) could not produce a proposal.
    #[error("reasoning component unavailable: {0}")]
    ReasoningUnavailable(String),

    /// The tool source session is not Ready; the caller must re-establish it.
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    /// The graph ran more node steps than its recursion limit allows.
    #[error("recursion limit of {0} steps reached")]
    RecursionLimit(usize),

    /// Execution failed with a message (e.g. graph wiring problem at runtime).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl AgentError {
    /// True when the error means the session is gone and must be re-established.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}
