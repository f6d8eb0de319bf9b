//! McpToolSource over Streamable HTTP against an in-process axum MCP stub.
//!
//! The stub assigns a session id on `initialize`, paginates `tools/list`,
//! answers `tools/call` as JSON or as an SSE stream, and counts DELETEs.
//! `/mcp-reject-initialized` serves the same stub but fails the
//! `notifications/initialized` step of the handshake.

#![cfg(feature = "mcp")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use mcpbridge::{
    Agent, AgentConfig, LlmResponse, McpTarget, McpToolSource, Message, MockLlm, SessionManager,
    ToolSource, ToolSourceError,
};
use serde_json::{json, Value};

const SESSION_ID: &str = "stub-session-1";

#[derive(Default)]
struct Stub {
    deletes: AtomicUsize,
    /// Session header seen on each POST after initialize.
    seen_sessions: Mutex<Vec<Option<String>>>,
    api_keys: Mutex<Vec<Option<String>>>,
    /// Client replies to server requests (POST bodies without `method`).
    replies: Mutex<Vec<Value>>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rpc_result(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn text_result(text: &str, is_error: bool) -> Value {
    json!({ "content": [{ "type": "text", "text": text }], "isError": is_error })
}

async fn handle_post(State(stub): State<Arc<Stub>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    if let Ok(mut keys) = stub.api_keys.lock() {
        keys.push(header_value(&headers, "x-api-key"));
    }

    if body.get("method").is_none() {
        if let Ok(mut replies) = stub.replies.lock() {
            replies.push(body);
        }
        return StatusCode::ACCEPTED.into_response();
    }

    if method == "initialize" {
        let result = rpc_result(
            &id,
            json!({
                "protocolVersion": "2025-11-25",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "stub", "version": "0.0.1" }
            }),
        );
        return ([("mcp-session-id", SESSION_ID)], Json(result)).into_response();
    }
    if let Ok(mut seen) = stub.seen_sessions.lock() {
        seen.push(header_value(&headers, "mcp-session-id"));
    }
    if id.is_null() {
        return StatusCode::ACCEPTED.into_response();
    }

    match method.as_str() {
        "tools/list" => {
            let result = match body["params"]["cursor"].as_str() {
                None => json!({
                    "tools": [{
                        "name": "echo",
                        "description": "Echo the text back.",
                        "inputSchema": {
                            "type": "object",
                            "properties": { "text": { "type": "string" } },
                            "required": ["text"]
                        }
                    }],
                    "nextCursor": "page-2"
                }),
                Some(_) => json!({
                    "tools": [
                        { "name": "fail", "inputSchema": { "type": "object", "properties": {} } },
                        { "name": "sse_echo", "inputSchema": { "type": "object", "properties": {} } },
                        { "name": "expire", "inputSchema": { "type": "object", "properties": {} } },
                        { "name": "sse_ping", "inputSchema": { "type": "object", "properties": {} } }
                    ]
                }),
            };
            Json(rpc_result(&id, result)).into_response()
        }
        "tools/call" => {
            let name = body["params"]["name"].as_str().unwrap_or_default();
            let args = &body["params"]["arguments"];
            match name {
                "echo" => {
                    let text = args["text"].as_str().unwrap_or_default();
                    Json(rpc_result(&id, text_result(text, false))).into_response()
                }
                "fail" => Json(rpc_result(&id, text_result("boom", true))).into_response(),
                "sse_echo" => {
                    let progress = json!({ "jsonrpc": "2.0", "method": "notifications/progress", "params": {} });
                    let response = rpc_result(&id, text_result("streamed", false));
                    let sse = format!(
                        "event: message\ndata: {}\n\nevent: message\ndata: {}\n\n",
                        progress, response
                    );
                    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
                }
                "sse_ping" => {
                    let ping = json!({ "jsonrpc": "2.0", "id": "srv-ping-1", "method": "ping" });
                    let response = rpc_result(&id, text_result("pong", false));
                    let sse = format!("data: {}\n\ndata: {}\n\n", ping, response);
                    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
                }
                "expire" => (StatusCode::NOT_FOUND, "unknown session").into_response(),
                other => Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32602, "message": format!("Unknown tool: {}", other) }
                }))
                .into_response(),
            }
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "Method not found" }
        }))
        .into_response(),
    }
}

async fn handle_post_rejecting_initialized(
    state: State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if body["method"] == "notifications/initialized" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "initialization rejected").into_response();
    }
    handle_post(state, headers, Json(body)).await
}

async fn handle_delete(State(stub): State<Arc<Stub>>) -> StatusCode {
    stub.deletes.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn spawn_stub() -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::default());
    let app = Router::new()
        .route("/mcptest", post(handle_post).delete(handle_delete))
        .route(
            "/mcp-reject-initialized",
            post(handle_post_rejecting_initialized).delete(handle_delete),
        )
        .with_state(Arc::clone(&stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}/mcptest", addr), stub)
}

/// **Scenario**: tools/list follows nextCursor across pages and returns every tool in order.
#[tokio::test]
async fn list_tools_follows_pagination() {
    let (url, stub) = spawn_stub().await;
    let source = McpToolSource::connect(&McpTarget::http(url)).await.unwrap();
    let tools = source.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["echo", "fail", "sse_echo", "expire", "sse_ping"]);
    assert_eq!(tools[0].description.as_deref(), Some("Echo the text back."));

    let seen = stub.seen_sessions.lock().unwrap().clone();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|s| s.as_deref() == Some(SESSION_ID)), "{:?}", seen);
}

#[tokio::test]
async fn call_tool_returns_text_and_maps_is_error() {
    let (url, _stub) = spawn_stub().await;
    let source = McpToolSource::connect(&McpTarget::http(url)).await.unwrap();

    let ok = source.call_tool("echo", json!({ "text": "hello" })).await.unwrap();
    assert_eq!(ok.text, "hello");

    let err = source.call_tool("fail", json!({})).await.unwrap_err();
    assert!(matches!(&err, ToolSourceError::ToolFailed(r) if r == "boom"), "{:?}", err);

    let err = source.call_tool("missing", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolSourceError::JsonRpc { code: -32602, .. }));
}

/// **Scenario**: An SSE-framed reply is parsed past the leading notification.
#[tokio::test]
async fn call_tool_reads_sse_response() {
    let (url, _stub) = spawn_stub().await;
    let source = McpToolSource::connect(&McpTarget::http(url)).await.unwrap();
    let out = source.call_tool("sse_echo", json!({})).await.unwrap();
    assert_eq!(out.text, "streamed");
}

/// **Scenario**: A ping embedded in the SSE reply is answered with an empty result under its id,
/// and the call still returns the tool output.
#[tokio::test]
async fn server_ping_in_sse_is_answered() {
    let (url, stub) = spawn_stub().await;
    let source = McpToolSource::connect(&McpTarget::http(url)).await.unwrap();
    let out = source.call_tool("sse_ping", json!({})).await.unwrap();
    assert_eq!(out.text, "pong");
    let replies = stub.replies.lock().unwrap().clone();
    assert_eq!(replies, vec![json!({ "jsonrpc": "2.0", "id": "srv-ping-1", "result": {} })]);
}

/// **Scenario**: The server assigns a session id, then rejects `notifications/initialized`.
/// Connect fails and the half-open server session is deleted.
#[tokio::test]
async fn failed_handshake_deletes_server_session() {
    let (url, stub) = spawn_stub().await;
    let url = url.replace("/mcptest", "/mcp-reject-initialized");
    let err = match McpToolSource::connect(&McpTarget::http(url)).await {
        Ok(_) => panic!("handshake should have failed"),
        Err(e) => e,
    };
    assert!(matches!(err, ToolSourceError::Transport(_)), "{:?}", err);
    assert_eq!(stub.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn not_found_with_session_is_disconnect() {
    let (url, _stub) = spawn_stub().await;
    let source = McpToolSource::connect(&McpTarget::http(url)).await.unwrap();
    let err = source.call_tool("expire", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolSourceError::Disconnected(_)), "{:?}", err);
}

#[tokio::test]
async fn extra_headers_are_sent_on_every_request() {
    let (url, stub) = spawn_stub().await;
    let target = McpTarget::Http {
        url,
        headers: vec![("x-api-key".to_string(), "secret".to_string())],
    };
    let source = McpToolSource::connect(&target).await.unwrap();
    source.list_tools().await.unwrap();
    let keys = stub.api_keys.lock().unwrap().clone();
    assert!(keys.iter().all(|k| k.as_deref() == Some("secret")), "{:?}", keys);
}

/// **Scenario**: disconnect sends DELETE for the server session.
#[tokio::test]
async fn session_manager_disconnect_deletes_server_session() {
    let (url, stub) = spawn_stub().await;
    let mut manager = SessionManager::default();
    let (_session, registry) = manager.connect(&McpTarget::http(url)).await.unwrap();
    assert_eq!(registry.len(), 5);
    manager.disconnect().await;
    assert_eq!(stub.deletes.load(Ordering::SeqCst), 1);
    manager.disconnect().await;
    assert_eq!(stub.deletes.load(Ordering::SeqCst), 1);
}

/// **Scenario**: A full turn over HTTP: the model calls echo, then answers with the observation.
#[tokio::test]
async fn agent_turn_over_http() {
    let (url, _stub) = spawn_stub().await;
    let llm = MockLlm::from_fn(|messages: &[Message], _tools| match messages.last() {
        Some(Message::User(c)) if c.starts_with("Observation from echo:") => {
            Ok(LlmResponse::answer(format!("The server said: {}", c.trim_start_matches("Observation from echo: "))))
        }
        _ => Ok(LlmResponse::tool_call("echo", json!({ "text": "ping" }))),
    });
    let agent = Agent::startup(&McpTarget::http(url), Arc::new(llm), AgentConfig::default())
        .await
        .unwrap();
    let turn = agent.run_turn("say ping").await.unwrap();
    assert_eq!(turn.invoked_tools(), vec!["echo"]);
    assert_eq!(turn.final_answer, "The server said: ping");
    agent.shutdown().await;
}

/// **Scenario**: Schema check rejects a call missing a required argument before any round trip.
#[tokio::test]
async fn adapter_rejects_missing_required_argument() {
    let (url, stub) = spawn_stub().await;
    let mut manager = SessionManager::default();
    let (_session, registry) = manager.connect(&McpTarget::http(url)).await.unwrap();
    let before = stub.seen_sessions.lock().unwrap().len();
    let result = registry.get("echo").unwrap().invoke(json!({})).await;
    assert!(!result.is_success());
    assert!(result.observation().contains("missing required parameter 'text'"), "{}", result.observation());
    assert_eq!(stub.seen_sessions.lock().unwrap().len(), before);
    manager.disconnect().await;
}
