//! State graph: nodes + linear edges, compile and invoke.
//!
//! Add nodes and edges, compile, then invoke with state. Nodes steer execution
//! with [`Next`]: continue the chain, jump to a node (how the ReAct loop goes
//! back from `observe` to `think`), or end.

mod compile_error;
mod compiled;
mod logging;
mod next;
mod node;
mod node_middleware;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, DEFAULT_RECURSION_LIMIT};
pub use logging::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeMiddleware, NodeRunFn};
pub use state_graph::{StateGraph, END, START};
