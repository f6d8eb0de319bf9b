//! Graph builder. Nodes are registered by id and wired with `add_edge`; the
//! edges must describe one path `START -> n1 -> ... -> nk -> END`.
//!
//! Back-jumps (the ReAct `observe -> think` step) are not edges. A node asks
//! for them at run time by returning [`Next::Node`](super::Next::Node).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, DEFAULT_RECURSION_LIMIT};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;

/// Entry marker, only valid as the source of an edge.
pub const START: &str = "__start__";

/// Exit marker, only valid as the target of an edge.
pub const END: &str = "__end__";

/// Mutable graph under construction, consumed by [`compile`](Self::compile).
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
}

impl<S> Default for StateGraph<S>
where
    S: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Registers `node` under `id`. A later call with the same id wins.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Wires `from` to `to`. Ids are checked in `compile`, not here.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validates the wiring and freezes the graph.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.build(None)
    }

    /// Like [`compile`](Self::compile), with every node run wrapped by `middleware`.
    pub fn compile_with_middleware(
        self,
        middleware: Arc<dyn NodeMiddleware<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.build(Some(middleware))
    }

    fn build(
        self,
        middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let known = |id: &str| self.nodes.contains_key(id);
        if let Some(id) = self
            .edges
            .iter()
            .flat_map(|(from, to)| [(from, from == START), (to, to == END)])
            .find_map(|(id, marker)| (!marker && !known(id.as_str())).then(|| id.clone()))
        {
            return Err(CompilationError::NodeNotFound(id));
        }

        let edge_order = chain_order(&self.edges)?;
        Ok(CompiledStateGraph {
            nodes: self.nodes,
            edge_order,
            middleware,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        })
    }
}

/// Walks the edges from START and returns the node ids in run order.
fn chain_order(edges: &[(String, String)]) -> Result<Vec<String>, CompilationError> {
    let entries: Vec<&str> = edges
        .iter()
        .filter(|(from, _)| from == START)
        .map(|(_, to)| to.as_str())
        .collect();
    let &[entry] = entries.as_slice() else {
        return Err(CompilationError::MissingStart);
    };
    if edges.iter().filter(|(_, to)| to == END).count() != 1 {
        return Err(CompilationError::MissingEnd);
    }

    let mut successor: HashMap<&str, &str> = HashMap::new();
    let mut targets: HashSet<&str> = HashSet::new();
    for (from, to) in edges.iter().filter(|(from, _)| from != START) {
        if successor.insert(from.as_str(), to.as_str()).is_some() {
            return Err(CompilationError::InvalidChain(format!(
                "'{}' has more than one outgoing edge (branch)",
                from
            )));
        }
        if to != END && !targets.insert(to.as_str()) {
            return Err(CompilationError::InvalidChain(format!(
                "'{}' has more than one incoming edge (merge)",
                to
            )));
        }
    }

    let mut order = vec![entry.to_string()];
    let mut current = entry;
    loop {
        match successor.get(current).copied() {
            Some(END) => return Ok(order),
            Some(next) if order.iter().any(|id| id == next) => {
                return Err(CompilationError::InvalidChain(format!(
                    "cycle detected at '{}'",
                    next
                )));
            }
            Some(next) => {
                order.push(next.to_string());
                current = next;
            }
            None => {
                return Err(CompilationError::InvalidChain(format!(
                    "'{}' has no outgoing edge and END is never reached",
                    current
                )));
            }
        }
    }
}
