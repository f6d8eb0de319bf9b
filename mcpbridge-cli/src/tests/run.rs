//! Unit tests for the run logic: banner, chat loop, config summary.
//!
//! The agent is built from the library's `MockToolSource` and `MockLlm`; the chat loop reads
//! from an in-memory buffer and writes to a `Vec<u8>`.

use std::sync::Arc;

use mcpbridge::{Agent, AgentConfig, LlmResponse, Message, MockLlm, MockToolBehavior, MockToolSource};
use serde_json::json;

use crate::config::{LlmConfig, RunConfig, ToolSourceConfig};
use crate::run::{banner, chat_loop, print_config_summary};

/// Answers with the observation after one list_products call.
fn products_llm() -> MockLlm {
    MockLlm::from_fn(|messages, _tools| match messages.last() {
        Some(Message::User(c)) if c.starts_with("Observation from ") => {
            Ok(LlmResponse::answer(format!("Here you go. {}", c)))
        }
        _ => Ok(LlmResponse::tool_call("list_products", json!({}))),
    })
}

async fn agent_with(mock: MockToolSource, llm: MockLlm) -> Agent {
    Agent::startup(&Arc::new(mock), Arc::new(llm), AgentConfig::default())
        .await
        .unwrap()
}

async fn chat(agent: &Agent, input: &str) -> (Result<(), crate::Error>, String) {
    let mut out = Vec::new();
    let result = chat_loop(agent, input.as_bytes(), &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

/// **Scenario**: The banner lists every discovered tool with its description.
#[tokio::test]
async fn banner_lists_tools() {
    let agent = agent_with(MockToolSource::products_example(), products_llm()).await;
    let line = banner(&agent);
    assert!(line.starts_with("Connected to server with tools: ["), "{}", line);
    assert!(line.contains("list_products: List all products in the database."), "{}", line);
    assert!(line.contains("get_product_by_id: Get a single product by its id."), "{}", line);
    agent.shutdown().await;
}

/// **Scenario**: One query is answered, then `QUIT` ends the loop before the next line.
#[tokio::test]
async fn chat_answers_then_quits() {
    let agent = agent_with(MockToolSource::products_example(), products_llm()).await;
    let (result, out) = chat(&agent, "Show me all products\nQUIT\nnever read\n").await;
    assert!(result.is_ok());
    assert!(out.contains("MCP Client Started!"));
    assert!(out.contains("Query: "));
    assert!(out.contains("MacBook Pro"), "{}", out);
    assert_eq!(out.matches("Here you go.").count(), 1);
    agent.shutdown().await;
}

/// **Scenario**: EOF ends the loop; blank lines are skipped without calling the model.
#[tokio::test]
async fn chat_stops_at_eof_and_skips_blank_lines() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("hello"));
    let agent = Agent::startup(
        &Arc::new(MockToolSource::products_example()),
        llm.clone(),
        AgentConfig::default(),
    )
    .await
    .unwrap();
    let (result, out) = chat(&agent, "\n   \nhi").await;
    assert!(result.is_ok());
    assert_eq!(llm.calls(), 1);
    assert!(out.contains("\nhello\n"), "{:?}", out);
    agent.shutdown().await;
}

/// **Scenario**: A reasoning failure is printed as an answer and the loop keeps going.
#[tokio::test]
async fn chat_continues_after_failed_query() {
    let agent = agent_with(MockToolSource::products_example(), MockLlm::unavailable("503")).await;
    let (result, out) = chat(&agent, "first\nsecond\nquit\n").await;
    assert!(result.is_ok());
    assert_eq!(out.matches("Error processing query:").count(), 2, "{}", out);
    agent.shutdown().await;
}

/// **Scenario**: After the data source drops, the next query ends the loop with an error.
#[tokio::test]
async fn chat_stops_when_source_is_gone() {
    let mock = MockToolSource::products_example().with_behavior("list_products", MockToolBehavior::Disconnect);
    let agent = agent_with(mock, products_llm()).await;
    let (result, out) = chat(&agent, "Show me all products\nagain\nquit\n").await;
    assert!(out.contains("data source is unavailable"), "{}", out);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("data source unavailable"), "{}", err);
    agent.shutdown().await;
}

#[test]
fn config_summary_hides_header_values() {
    let config = RunConfig {
        tool_source: ToolSourceConfig::Http {
            url: "http://localhost:8000/mcptest".into(),
            headers: vec![("x-api-key".into(), "secret".into())],
        },
        llm: LlmConfig::OpenAi {
            api_base: "https://api.openai.com/v1".into(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
        },
        temperature: 0.0,
        tool_choice: None,
        max_iterations: 5,
        tool_retries: 0,
        tool_retry_backoff: std::time::Duration::ZERO,
        tool_call_timeout: std::time::Duration::from_secs(60),
        verbose: true,
    };
    let mut out = Vec::new();
    print_config_summary(&config, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("http http://localhost:8000/mcptest"), "{}", text);
    assert!(text.contains("x-api-key"));
    assert!(!text.contains("secret"));
    assert!(!text.contains("sk-test"));
    assert!(text.contains("max_iterations=5"));
}
