//! Where to go after a node has run.

/// Returned by [`Node::run`](super::Node::run) together with the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Next node in edge order; ends after the last one.
    Continue,
    /// Jump to the node with this id.
    Node(String),
    /// Stop and return the current state.
    End,
}
