//! StateGraph invoke: chain order, Next::Node loops, recursion limit, middleware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mcpbridge::graph::{LoggingNodeMiddleware, NodeMiddleware, NodeRunFn};
use mcpbridge::{AgentError, Message, Next, StateGraph, END, START};

use crate::common::{ChatState, EchoNode, LoopBackNode};

fn user_state(text: &str) -> ChatState {
    ChatState {
        messages: vec![Message::user(text)],
        rounds: 0,
    }
}

#[tokio::test]
async fn invoke_echo_appends_assistant_message() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", END);

    let out = graph.compile().unwrap().invoke(user_state("hello")).await.unwrap();
    assert_eq!(out.messages.last(), Some(&Message::assistant("hello")));
}

/// **Scenario**: A node jumping back with Next::Node loops until it returns End.
#[tokio::test]
async fn next_node_loops_until_end() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_node("loop_back", Arc::new(LoopBackNode { target: "echo", until: 3 }));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", "loop_back");
    graph.add_edge("loop_back", END);

    let out = graph.compile().unwrap().invoke(user_state("hi")).await.unwrap();
    assert_eq!(out.rounds, 3);
    assert_eq!(
        out.messages.iter().filter(|m| matches!(m, Message::Assistant(_))).count(),
        3
    );
}

#[tokio::test]
async fn loop_beyond_recursion_limit_fails() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_node("loop_back", Arc::new(LoopBackNode { target: "echo", until: 100 }));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", "loop_back");
    graph.add_edge("loop_back", END);

    let compiled = graph.compile().unwrap().with_recursion_limit(6);
    match compiled.invoke(user_state("hi")).await {
        Err(AgentError::RecursionLimit(6)) => {}
        other => panic!("expected RecursionLimit(6), got {:?}", other.map(|s| s.rounds)),
    }
}

/// Counts node runs.
struct CountingMiddleware(Arc<AtomicUsize>);

#[async_trait]
impl NodeMiddleware<ChatState> for CountingMiddleware {
    async fn around_run(
        &self,
        _node_id: &str,
        state: ChatState,
        inner: NodeRunFn<ChatState>,
    ) -> Result<(ChatState, Next), AgentError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        inner(state).await
    }
}

/// **Scenario**: compile_with_middleware wraps every node run.
#[tokio::test]
async fn middleware_wraps_every_node_run() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_node("loop_back", Arc::new(LoopBackNode { target: "echo", until: 2 }));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", "loop_back");
    graph.add_edge("loop_back", END);

    let compiled = graph
        .compile_with_middleware(Arc::new(CountingMiddleware(Arc::clone(&count))))
        .unwrap();
    compiled.invoke(user_state("hi")).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn logging_middleware_keeps_output() {
    let mut graph = StateGraph::<ChatState>::new();
    graph.add_node("echo", Arc::new(EchoNode));
    graph.add_edge(START, "echo");
    graph.add_edge("echo", END);

    let out = graph
        .compile_with_middleware(Arc::new(LoggingNodeMiddleware))
        .unwrap()
        .invoke(user_state("ping"))
        .await
        .unwrap();
    assert_eq!(out.messages.last(), Some(&Message::assistant("ping")));
}
