//! Errors from [`StateGraph::compile`](super::StateGraph::compile).

use thiserror::Error;

/// The edges do not describe a runnable chain.
///
/// The ReAct graph is wired once at orchestrator construction, so any of these
/// is a programming error surfaced before the first turn.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// An edge names a node that was never added (START/END excepted).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Zero or several edges leave START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Zero or several edges enter END.
    #[error("graph must have exactly one edge to END")]
    MissingEnd,

    /// Branch, merge, cycle, or a tail that is not the END edge.
    #[error("edges must form a single linear chain from START to END: {0}")]
    InvalidChain(String),
}
