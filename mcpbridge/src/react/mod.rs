//! ReAct graph nodes and the orchestrator that runs them.
//!
//! Three nodes implementing `Node<ReActState>` form the chain
//! think → act → observe; observe jumps back to think until the reasoning
//! component answers or the iteration limit is reached.

mod act_node;
mod observe_node;
mod runner;
mod think_node;

pub use act_node::{ActNode, RetryPolicy};
pub use observe_node::{ObserveNode, NO_RESPONSE};
pub use runner::{build_initial_state, Orchestrator, OrchestratorConfig};
pub use think_node::ThinkNode;

/// First `max` characters of `s`, with "..." appended when anything was cut.
pub(crate) fn ellipsize(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

/// Default system instruction. `{tools}` is replaced by one `name: description`
/// line per discovered tool.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant that can interact with various tools and services. Use the available tools to help users with their requests. Always provide clear and helpful responses.
You have the following tools available:
{tools}

Call a tool only when you need data you do not have. After each tool result, decide whether to call another tool or answer. If a tool reports an error, you may retry with different arguments, try another tool, or answer with what you know. Do not make up facts; base your answer on tool results."#;
