//! MCP tool source: `tools/list` and `tools/call` over Streamable HTTP or stdio.
//!
//! [`McpTarget`] describes where the server lives and implements
//! [`Connector`](crate::session::Connector), so a `SessionManager` can connect to it.

mod protocol;
mod session_http;
mod session_stdio;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use protocol::MCP_PROTOCOL_VERSION;
pub use session_http::McpHttpSession;
pub use session_stdio::McpStdioSession;

use protocol::{ToolCallResult, ToolsListResult};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};
use crate::session::Connector;

/// Upper bound on `tools/list` pages; guards against a server that never stops paginating.
const MAX_LIST_PAGES: usize = 64;

/// Where the MCP server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpTarget {
    /// Streamable HTTP endpoint, e.g. `http://localhost:8000/mcptest`.
    Http {
        url: String,
        headers: Vec<(String, String)>,
    },
    /// Server spawned as a child process speaking JSON-RPC on stdin/stdout.
    Stdio {
        command: String,
        args: Vec<String>,
        env: Vec<(String, String)>,
    },
}

impl McpTarget {
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args,
            env: Vec::new(),
        }
    }
}

impl std::fmt::Display for McpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { url, .. } => write!(f, "{}", url),
            Self::Stdio { command, args, .. } => {
                write!(f, "{}", command)?;
                for a in args {
                    write!(f, " {}", a)?;
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Connector for McpTarget {
    async fn connect(&self) -> Result<Arc<dyn ToolSource>, ToolSourceError> {
        Ok(Arc::new(McpToolSource::connect(self).await?))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

enum Transport {
    Http(McpHttpSession),
    Stdio(McpStdioSession),
}

/// Tool source backed by an initialized MCP session.
pub struct McpToolSource {
    transport: Transport,
}

impl McpToolSource {
    /// Opens the transport and completes the MCP handshake.
    pub async fn connect(target: &McpTarget) -> Result<Self, ToolSourceError> {
        let transport = match target {
            McpTarget::Http { url, headers } => {
                Transport::Http(McpHttpSession::connect(url.clone(), headers.clone()).await?)
            }
            McpTarget::Stdio { command, args, env } => {
                Transport::Stdio(McpStdioSession::spawn(command, args, env).await?)
            }
        };
        Ok(Self { transport })
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ToolSourceError> {
        match &self.transport {
            Transport::Http(s) => s.request(method, params).await,
            Transport::Stdio(s) => s.request(method, params).await,
        }
    }
}

#[async_trait]
impl ToolSource for McpToolSource {
    /// Follows `nextCursor` until the server stops paginating.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;
            let page: ToolsListResult = serde_json::from_value(result)
                .map_err(|e| ToolSourceError::Malformed(format!("tools/list: {}", e)))?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }
        Err(ToolSourceError::Malformed(format!(
            "tools/list did not finish within {} pages",
            MAX_LIST_PAGES
        )))
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", Some(params)).await?;
        ToolCallResult::from_value(result)?.into_content()
    }

    async fn close(&self) -> Result<(), ToolSourceError> {
        match &self.transport {
            Transport::Http(s) => s.close().await,
            Transport::Stdio(s) => {
                s.close().await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_display() {
        assert_eq!(McpTarget::http("http://localhost:8000/mcptest").to_string(), "http://localhost:8000/mcptest");
        let t = McpTarget::stdio("python3", vec!["src/server.py".into()]);
        assert_eq!(t.to_string(), "python3 src/server.py");
    }
}
