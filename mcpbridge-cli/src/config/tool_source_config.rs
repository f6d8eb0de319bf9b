//! Where the MCP server lives: a Streamable HTTP URL or a command spawned over stdio.
//!
//! Used by [`RunConfig`](super::RunConfig); converted into a library
//! [`McpTarget`](mcpbridge::McpTarget) at startup.

use mcpbridge::McpTarget;

/// Command used when neither `MCP_SERVER_URL` nor `MCP_SERVER_COMMAND` is set.
pub const DEFAULT_SERVER_COMMAND: &str = "python3";
/// Args used with [`DEFAULT_SERVER_COMMAND`].
pub const DEFAULT_SERVER_ARGS: &str = "src/server.py";

/// MCP server target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolSourceConfig {
    /// Streamable HTTP endpoint, e.g. `http://localhost:8000/mcptest`.
    Http {
        url: String,
        /// Extra request headers, e.g. an API key.
        headers: Vec<(String, String)>,
    },
    /// Server spawned as a child process.
    Stdio { command: String, args: Vec<String> },
}

impl Default for ToolSourceConfig {
    fn default() -> Self {
        Self::Stdio {
            command: DEFAULT_SERVER_COMMAND.to_string(),
            args: split_args(DEFAULT_SERVER_ARGS),
        }
    }
}

impl ToolSourceConfig {
    pub fn to_target(&self) -> McpTarget {
        match self {
            Self::Http { url, headers } => McpTarget::Http {
                url: url.clone(),
                headers: headers.clone(),
            },
            Self::Stdio { command, args } => McpTarget::stdio(command.clone(), args.clone()),
        }
    }
}

/// Splits a whitespace-separated argument string.
pub fn split_args(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Parses `k=v,k=v` into header pairs. Entries without `=` or with an empty key are skipped.
pub fn parse_headers(s: &str) -> Vec<(String, String)> {
    s.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}
