//! Mock ToolSource for tests and examples.
//!
//! Returns a fixed tool list; per-tool behavior can be scripted (text, failure,
//! dropped connection, slow response, custom handler). Records every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

type HandlerFn = Arc<dyn Fn(&Value) -> Result<ToolCallContent, ToolSourceError> + Send + Sync>;

/// Scripted behavior for one tool of a [`MockToolSource`].
#[derive(Clone)]
pub enum MockToolBehavior {
    /// Succeeds with this text.
    Text(String),
    /// Remote tool reports failure with this reason.
    Fail(String),
    /// Transport drops mid-call.
    Disconnect,
    /// Sleeps, then succeeds with the text.
    Slow(Duration, String),
    /// Custom handler over the arguments.
    Handler(HandlerFn),
}

impl MockToolBehavior {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<ToolCallContent, ToolSourceError> + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(f))
    }
}

/// Mock tool source: fixed tool list and scripted call results.
///
/// `list_tools()` returns the configured list (or a configured error);
/// `call_tool(name, _)` uses the per-name behavior, falling back to `call_result`.
/// Tracks calls and the peak number of concurrent calls.
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    call_result: String,
    behaviors: HashMap<String, MockToolBehavior>,
    list_error: Option<String>,
    list_delay: Option<Duration>,
    calls: Mutex<Vec<(String, Value)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl MockToolSource {
    /// Creates a mock with custom tool list and fixed call result.
    pub fn new(tools: Vec<ToolSpec>, call_result: String) -> Self {
        Self {
            tools,
            call_result,
            behaviors: HashMap::new(),
            list_error: None,
            list_delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a mock that lists one tool `get_time` and returns fixed time string on call.
    pub fn get_time_example() -> Self {
        Self::new(
            vec![ToolSpec {
                name: "get_time".to_string(),
                description: Some("Get current time.".to_string()),
                input_schema: json!({ "type": "object", "properties": {} }),
            }],
            "2025-01-29 12:00:00".to_string(),
        )
    }

    /// Product catalog tools as a FastMCP server publishes them:
    /// `list_products(limit = 10)` and `get_product_by_id(id)`.
    ///
    /// `list_products` returns two products; `get_product_by_id` knows `prod-001`
    /// and fails with "not found" for anything else.
    pub fn products_example() -> Self {
        let tools = vec![
            ToolSpec {
                name: "list_products".to_string(),
                description: Some("List all products in the database.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "title": "list_productsArguments",
                    "properties": {
                        "limit": { "type": "integer", "default": 10, "title": "Limit" }
                    }
                }),
            },
            ToolSpec {
                name: "get_product_by_id".to_string(),
                description: Some("Get a single product by its id.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "title": "get_product_by_idArguments",
                    "properties": {
                        "id": { "type": "string", "title": "Id" }
                    },
                    "required": ["id"]
                }),
            },
        ];
        Self::new(tools, String::new())
            .with_behavior(
                "list_products",
                MockToolBehavior::Text(
                    "Found 2 products:\n- MacBook Pro (ID: prod-001, Price: $2399)\n- Surface Laptop (ID: prod-002, Price: $1299)"
                        .to_string(),
                ),
            )
            .with_behavior(
                "get_product_by_id",
                MockToolBehavior::handler(|args| {
                    match args.get("id").and_then(Value::as_str) {
                        Some("prod-001") => Ok(ToolCallContent {
                            text: "MacBook Pro (ID: prod-001, Price: $2399)".to_string(),
                            structured: Some(json!({ "id": "prod-001", "name": "MacBook Pro", "price": 2399 })),
                        }),
                        _ => Err(ToolSourceError::ToolFailed("not found".to_string())),
                    }
                }),
            )
    }

    /// Set the text returned by call_tool for tools without a behavior (builder style).
    pub fn with_call_result(mut self, text: String) -> Self {
        self.call_result = text;
        self
    }

    /// Scripts the behavior of one tool (builder style).
    pub fn with_behavior(mut self, name: impl Into<String>, behavior: MockToolBehavior) -> Self {
        self.behaviors.insert(name.into(), behavior);
        self
    }

    /// Makes `list_tools` fail with a transport error (builder style).
    pub fn with_list_error(mut self, reason: impl Into<String>) -> Self {
        self.list_error = Some(reason.into());
        self
    }

    /// Delays `list_tools` (a server that never finishes discovery).
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn run_behavior(&self, name: &str, arguments: &Value) -> Result<ToolCallContent, ToolSourceError> {
        match self.behaviors.get(name) {
            Some(MockToolBehavior::Text(t)) => Ok(ToolCallContent::text(t.clone())),
            Some(MockToolBehavior::Fail(reason)) => Err(ToolSourceError::ToolFailed(reason.clone())),
            Some(MockToolBehavior::Disconnect) => {
                Err(ToolSourceError::Disconnected("mock transport dropped".to_string()))
            }
            Some(MockToolBehavior::Slow(delay, t)) => {
                tokio::time::sleep(*delay).await;
                Ok(ToolCallContent::text(t.clone()))
            }
            Some(MockToolBehavior::Handler(f)) => f(arguments),
            None if self.tools.iter().any(|t| t.name == name) => {
                Ok(ToolCallContent::text(self.call_result.clone()))
            }
            None => Err(ToolSourceError::NotFound(name.to_string())),
        }
    }
}

impl Default for MockToolSource {
    fn default() -> Self {
        Self::get_time_example()
    }
}

/// Decrements the in-flight counter when a call finishes or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.list_error {
            return Err(ToolSourceError::Transport(reason.clone()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((name.to_string(), arguments.clone()));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);
        self.run_behavior(name, &arguments).await
    }

    async fn close(&self) -> Result<(), ToolSourceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
