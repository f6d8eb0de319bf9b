//! StateGraph compile failure cases: unknown node, missing START/END, invalid chain.

use std::sync::Arc;

use mcpbridge::{CompilationError, StateGraph, END, START};

use crate::common::{ChatState, EchoNode};

#[tokio::test]
async fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", "missing");

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        _ => panic!("expected NodeNotFound"),
    }
}

#[tokio::test]
async fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_edge("echo", END);

    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

#[tokio::test]
async fn compile_fails_without_end_edge() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_edge(START, "echo");

    assert!(matches!(graph.compile(), Err(CompilationError::MissingEnd)));
}

/// **Scenario**: Two edges leaving the same node are a branch, which the linear chain rejects.
#[tokio::test]
async fn compile_fails_on_branch() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("a", Arc::new(EchoNode));
    graph.add_node("b", Arc::new(EchoNode));
    graph.add_node("c", Arc::new(EchoNode));
    graph.add_edge(START, "a");
    graph.add_edge("a", "b");
    graph.add_edge("a", "c");
    graph.add_edge("c", END);

    match graph.compile() {
        Err(CompilationError::InvalidChain(msg)) => assert!(msg.contains("branch"), "{}", msg),
        _ => panic!("expected InvalidChain"),
    }
}
