//! Remote tool source contract: discovery (`list_tools`) and invocation (`call_tool`).
//!
//! The core only depends on [`ToolSource`]; concrete transports live in [`mcp`]
//! (Streamable HTTP and stdio) and [`MockToolSource`] serves tests.

#[cfg(feature = "mcp")]
pub mod mcp;
mod mock;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[cfg(feature = "mcp")]
pub use mcp::{McpTarget, McpToolSource};
pub use mock::{MockToolSource, MockToolBehavior};

/// Tool specification as published by the remote source.
///
/// Wire form: `input_schema` is the raw JSON Schema. Converted into a typed
/// [`ToolDescriptor`](crate::tools::ToolDescriptor) at discovery time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

/// Successful tool output: concatenated text content plus optional structured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
    pub structured: Option<Value>,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }
}

/// Errors from a tool source. Never escape a [`ToolAdapter`](crate::tools::ToolAdapter):
/// the adapter turns each of them into an `InvocationResult::Failure`.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },
    /// The remote tool ran and reported failure (`isError: true`).
    #[error("{0}")]
    ToolFailed(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The connection to the remote source is gone; the session cannot be used again.
    #[error("connection closed: {0}")]
    Disconnected(String),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// The session is not in the Ready state.
    #[error("session not ready ({0})")]
    NotReady(String),
}

/// Remote tool source: discovery and invocation.
///
/// Implementations must be usable from several tasks at once; the
/// [`Session`](crate::session::Session) decides how many calls run concurrently.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Lists every tool the source currently exposes.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Invokes one tool with JSON arguments.
    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolCallContent, ToolSourceError>;

    /// Releases transport resources. Called once by the session on teardown.
    async fn close(&self) -> Result<(), ToolSourceError> {
        Ok(())
    }
}
