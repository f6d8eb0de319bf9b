//! JSON-RPC 2.0 messages and MCP result payloads shared by the HTTP and stdio transports.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision sent in `initialize` and the `MCP-Protocol-Version` header.
pub const MCP_PROTOCOL_VERSION: &str = "2025-11-25";

/// Outgoing request (has an `id`).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// Outgoing notification (no `id`, no reply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Result value, or the JSON-RPC error as [`ToolSourceError::JsonRpc`].
    pub fn into_result(self) -> Result<Value, ToolSourceError> {
        match self.error {
            Some(e) => Err(ToolSourceError::JsonRpc {
                code: e.code,
                message: e.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Numeric id, when the server echoed one.
    pub fn id_u64(&self) -> Option<u64> {
        self.id.as_u64()
    }
}

/// Error code for a method the receiver does not implement.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Request initiated by the server; it expects a response carrying the same `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRequest {
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl ServerRequest {
    /// `ping` is answered with an empty result; this client serves nothing else.
    pub fn reply(&self) -> JsonRpcResponse {
        let (result, error) = match self.method.as_str() {
            "ping" => (Some(json!({})), None),
            other => (
                None,
                Some(JsonRpcError {
                    code: METHOD_NOT_FOUND,
                    message: format!("Method not found: {}", other),
                    data: None,
                }),
            ),
        };
        JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: self.id.clone(),
            result,
            error,
        }
    }
}

/// Anything a server may send.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Reply to one of our requests.
    Response(JsonRpcResponse),
    /// Server-to-client request (`ping`, sampling, roots); must be answered.
    Request(ServerRequest),
    Notification(JsonRpcNotification),
}

impl ServerMessage {
    /// `method` plus a non-null `id` is a request, `method` alone a notification,
    /// anything else a response.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(line)?;
        let has_id = raw.get("id").is_some_and(|id| !id.is_null());
        match (raw.get("method").is_some(), has_id) {
            (true, true) => Ok(Self::Request(serde_json::from_value(raw)?)),
            (true, false) => Ok(Self::Notification(serde_json::from_value(raw)?)),
            (false, _) => Ok(Self::Response(serde_json::from_value(raw)?)),
        }
    }
}

/// `initialize` params for this client.
pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": "mcpbridge",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// `tools/list` result page.
#[derive(Debug, Deserialize)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// One item of `tools/call` content. Only text items contribute to the observation.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// `tools/call` result.
#[derive(Debug, Deserialize)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, rename = "structuredContent")]
    pub structured_content: Option<Value>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Parses a raw `tools/call` result value.
    pub fn from_value(value: Value) -> Result<Self, ToolSourceError> {
        serde_json::from_value(value).map_err(|e| ToolSourceError::Malformed(e.to_string()))
    }

    fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `isError: true` becomes [`ToolSourceError::ToolFailed`] carrying the text.
    pub fn into_content(self) -> Result<ToolCallContent, ToolSourceError> {
        let mut text = self.joined_text();
        if self.is_error {
            if text.is_empty() {
                text = "tool reported an error".to_string();
            }
            return Err(ToolSourceError::ToolFailed(text));
        }
        if text.is_empty() {
            if let Some(s) = &self.structured_content {
                text = s.to_string();
            }
        }
        Ok(ToolCallContent {
            text,
            structured: self.structured_content,
        })
    }
}
