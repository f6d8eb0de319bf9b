//! MCP session over Streamable HTTP: POST one JSON-RPC message per request.
//!
//! Implements the client side of the Streamable HTTP transport: `Accept` both
//! `application/json` and `text/event-stream`, the server-assigned
//! `Mcp-Session-Id` is echoed on every later request, and `MCP-Protocol-Version`
//! is always sent. SSE-framed replies are scanned for the response matching the
//! request id. `close` sends DELETE to end the server-side session.
//!
//! **Interaction**: Created by `McpToolSource::connect` for [`McpTarget::Http`](super::McpTarget).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::protocol::{
    initialize_params, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ServerMessage,
    ServerRequest, MCP_PROTOCOL_VERSION,
};
use crate::tool_source::ToolSourceError;

const SESSION_HEADER: &str = "Mcp-Session-Id";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

fn transport_error(e: reqwest::Error) -> ToolSourceError {
    if e.is_connect() {
        ToolSourceError::Disconnected(e.to_string())
    } else if e.is_timeout() {
        ToolSourceError::Timeout(HTTP_TIMEOUT)
    } else {
        ToolSourceError::Transport(e.to_string())
    }
}

/// MCP session over Streamable HTTP.
pub struct McpHttpSession {
    client: Client,
    url: String,
    /// Extra headers (e.g. an API key) sent on every request.
    headers: Vec<(String, String)>,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl McpHttpSession {
    /// Connects and completes the `initialize` / `notifications/initialized` handshake.
    pub async fn connect(
        url: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Result<Self, ToolSourceError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let session = Self {
            client,
            url: url.into(),
            headers,
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
        };
        if let Err(e) = session.handshake().await {
            // The server may already have assigned a session id.
            let _ = session.close().await;
            return Err(e);
        }
        tracing::debug!(url = %session.url, session_id = ?session.session_id(), "MCP HTTP session initialized");
        Ok(session)
    }

    async fn handshake(&self) -> Result<(), ToolSourceError> {
        let init = self.request("initialize", Some(initialize_params())).await?;
        if let Some(v) = init.get("protocolVersion").and_then(Value::as_str) {
            if v != MCP_PROTOCOL_VERSION {
                tracing::debug!(server_version = %v, "MCP server negotiated a different protocol version");
            }
        }
        self.notify("notifications/initialized").await
    }

    /// Server-assigned session id, if any.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|g| g.clone())
    }

    fn with_headers(&self, mut req: RequestBuilder) -> RequestBuilder {
        req = req.header("MCP-Protocol-Version", MCP_PROTOCOL_VERSION);
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(sid) = self.session_id() {
            req = req.header(SESSION_HEADER, sid);
        }
        req
    }

    async fn post(&self, body: Vec<u8>) -> Result<Response, ToolSourceError> {
        let req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .body(body);
        let resp = self.with_headers(req).send().await.map_err(transport_error)?;
        if let Some(sid) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if let Ok(mut guard) = self.session_id.lock() {
                *guard = Some(sid.to_string());
            }
        }
        Ok(resp)
    }

    async fn check_status(resp: Response, method: &str, had_session: bool) -> Result<Response, ToolSourceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let detail = if text.is_empty() { "no body".to_string() } else { text };
        if status == StatusCode::NOT_FOUND && had_session {
            return Err(ToolSourceError::Disconnected(format!(
                "{} HTTP 404: session expired: {}",
                method, detail
            )));
        }
        Err(ToolSourceError::Transport(format!("{} HTTP {}: {}", method, status, detail)))
    }

    /// Sends a notification; `202 Accepted` or any 2xx counts as delivered.
    pub async fn notify(&self, method: &str) -> Result<(), ToolSourceError> {
        let body = serde_json::to_vec(&JsonRpcNotification::new(method, None))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        self.post_expecting_accept(body, method).await
    }

    async fn post_expecting_accept(&self, body: Vec<u8>, label: &str) -> Result<(), ToolSourceError> {
        let had_session = self.session_id().is_some();
        let resp = self.post(body).await?;
        Self::check_status(resp, label, had_session).await?;
        Ok(())
    }

    /// POSTs the reply to a request the server embedded in an SSE stream.
    async fn answer(&self, request: &ServerRequest) {
        tracing::debug!(method = %request.method, id = %request.id, "MCP server request");
        let sent = match serde_json::to_vec(&request.reply()) {
            Ok(body) => self.post_expecting_accept(body, &request.method).await,
            Err(e) => Err(ToolSourceError::Transport(e.to_string())),
        };
        if let Err(e) = sent {
            tracing::debug!(error = %e, "could not answer MCP server request");
        }
    }

    /// Sends one request and returns its `result`.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ToolSourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(&JsonRpcRequest::new(id, method, params))
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let had_session = self.session_id().is_some();
        let resp = self.post(body).await?;
        let resp = Self::check_status(resp, method, had_session).await?;

        let is_sse = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/event-stream"))
            .unwrap_or(false);
        let text = resp.text().await.map_err(transport_error)?;
        let response = if is_sse {
            let (response, requests) = response_from_sse(&text, id)?;
            for request in &requests {
                self.answer(request).await;
            }
            response
        } else {
            serde_json::from_str::<JsonRpcResponse>(&text)
                .map_err(|e| ToolSourceError::Malformed(format!("{} response: {}", method, e)))?
        };
        response.into_result()
    }

    /// Ends the server-side session with DELETE. Servers may answer 405; that is not an error.
    pub async fn close(&self) -> Result<(), ToolSourceError> {
        if self.session_id().is_none() {
            return Ok(());
        }
        let req = self.with_headers(self.client.delete(&self.url));
        match req.send().await {
            Ok(resp) if resp.status().is_success() || resp.status() == StatusCode::METHOD_NOT_ALLOWED => {}
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "MCP session DELETE not accepted");
            }
            Err(e) => {
                tracing::debug!(error = %e, "MCP session DELETE failed");
            }
        }
        if let Ok(mut guard) = self.session_id.lock() {
            *guard = None;
        }
        Ok(())
    }
}

/// Finds the JSON-RPC response with `id` among the `data:` events of an SSE body,
/// along with any server requests that preceded it.
pub(crate) fn response_from_sse(
    body: &str,
    id: u64,
) -> Result<(JsonRpcResponse, Vec<ServerRequest>), ToolSourceError> {
    let mut data = String::new();
    let mut events = Vec::new();
    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line.is_empty() && !data.is_empty() {
            events.push(std::mem::take(&mut data));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }
    let mut requests = Vec::new();
    for event in events {
        match ServerMessage::from_line(&event) {
            Ok(ServerMessage::Response(resp)) if resp.id_u64() == Some(id) => {
                return Ok((resp, requests));
            }
            Ok(ServerMessage::Request(request)) => requests.push(request),
            _ => {}
        }
    }
    Err(ToolSourceError::Malformed(format!(
        "event stream ended without a response to request {}",
        id
    )))
}
