//! Run config: MCP server target, LLM backend, loop limits. Filled from env / .env.
//!
//! Interacts with [`RunOptions`](super::RunOptions) (CLI overrides), the library's
//! [`AgentConfig`](mcpbridge::AgentConfig) and [`ToolChoiceMode`].

use std::time::Duration;

use mcpbridge::{AgentConfig, OrchestratorConfig, RetryPolicy, SessionConfig, ToolChoiceMode};

use super::{parse_headers, split_args, LlmConfig, RunOptions, ToolSourceConfig};
use super::{DEFAULT_AZURE_API_VERSION, DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND};

/// Error type used for config loading.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_MAX_ITERATIONS: u32 = 10;
const DEFAULT_TOOL_CALL_TIMEOUT_SECS: u64 = 60;

/// Everything one CLI run needs.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub tool_source: ToolSourceConfig,
    pub llm: LlmConfig,
    /// Sampling temperature. Default 0.
    pub temperature: f32,
    /// Tool choice mode: auto (model chooses), none (no tools), required (must use tools).
    pub tool_choice: Option<ToolChoiceMode>,
    /// Act/observe rounds per query before the answer is summarized from the trace.
    pub max_iterations: u32,
    /// Extra attempts for a failed tool call while the session is up.
    pub tool_retries: u32,
    pub tool_retry_backoff: Duration,
    /// Upper bound for one tool call, queueing included.
    pub tool_call_timeout: Duration,
    /// Debug logs, node enter/exit, config summary on stderr.
    pub verbose: bool,
}

impl RunConfig {
    /// Fill config from env vars (and .env). Call `dotenv::dotenv().ok()` first to load `.env`.
    ///
    /// MCP server: `MCP_SERVER_URL` (+ `MCP_HEADERS`), otherwise `MCP_SERVER_COMMAND` /
    /// `MCP_SERVER_ARGS` (default `python3 src/server.py`).
    /// LLM: `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_DEPLOYMENT_NAME`,
    /// `AZURE_OPENAI_API_VERSION` select Azure; otherwise `OPENAI_API_KEY` (required),
    /// `OPENAI_API_BASE`, `OPENAI_MODEL`. `OPENAI_TEMPERATURE`, `OPENAI_TOOL_CHOICE` optional.
    /// Loop: `MAX_ITERATIONS`, `TOOL_RETRIES`, `TOOL_RETRY_BACKOFF_MS`, `TOOL_CALL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let tool_source = match non_empty("MCP_SERVER_URL") {
            Some(url) => ToolSourceConfig::Http {
                url,
                headers: non_empty("MCP_HEADERS")
                    .map(|h| parse_headers(&h))
                    .unwrap_or_default(),
            },
            None => ToolSourceConfig::Stdio {
                command: non_empty("MCP_SERVER_COMMAND")
                    .unwrap_or_else(|| DEFAULT_SERVER_COMMAND.to_string()),
                args: split_args(
                    &non_empty("MCP_SERVER_ARGS").unwrap_or_else(|| DEFAULT_SERVER_ARGS.to_string()),
                ),
            },
        };

        let llm = match non_empty("AZURE_OPENAI_ENDPOINT") {
            Some(endpoint) => LlmConfig::Azure {
                endpoint,
                api_key: non_empty("AZURE_OPENAI_API_KEY").ok_or_else(|| {
                    missing("AZURE_OPENAI_API_KEY is not set; it is required with AZURE_OPENAI_ENDPOINT")
                })?,
                deployment: non_empty("AZURE_OPENAI_DEPLOYMENT_NAME").ok_or_else(|| {
                    missing("AZURE_OPENAI_DEPLOYMENT_NAME is not set; it is required with AZURE_OPENAI_ENDPOINT")
                })?,
                api_version: non_empty("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            },
            None => LlmConfig::OpenAi {
                api_key: non_empty("OPENAI_API_KEY").ok_or_else(|| {
                    missing("OPENAI_API_KEY is not set; please configure it in .env (or set AZURE_OPENAI_ENDPOINT)")
                })?,
                api_base: non_empty("OPENAI_API_BASE")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                model: non_empty("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            },
        };

        let parsed = |key: &str| non_empty(key).and_then(|s| s.trim().parse::<u64>().ok());

        Ok(Self {
            tool_source,
            llm,
            temperature: non_empty("OPENAI_TEMPERATURE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0.0),
            tool_choice: non_empty("OPENAI_TOOL_CHOICE").and_then(|s| s.parse().ok()),
            max_iterations: parsed("MAX_ITERATIONS")
                .map(|n| n.clamp(1, u32::MAX as u64) as u32)
                .unwrap_or(DEFAULT_MAX_ITERATIONS),
            tool_retries: parsed("TOOL_RETRIES").map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(0),
            tool_retry_backoff: Duration::from_millis(parsed("TOOL_RETRY_BACKOFF_MS").unwrap_or(0)),
            tool_call_timeout: Duration::from_secs(
                parsed("TOOL_CALL_TIMEOUT_SECS")
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_TOOL_CALL_TIMEOUT_SECS),
            ),
            verbose: false,
        })
    }

    /// Apply optional overrides from `RunOptions`. Only set fields override.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(url) = &options.url {
            let headers = match &self.tool_source {
                ToolSourceConfig::Http { headers, .. } => headers.clone(),
                ToolSourceConfig::Stdio { .. } => Vec::new(),
            };
            self.tool_source = ToolSourceConfig::Http {
                url: url.clone(),
                headers,
            };
        } else if let Some(command) = &options.command {
            self.tool_source = ToolSourceConfig::Stdio {
                command: command.clone(),
                args: options.args.clone(),
            };
        }
        if let Some(n) = options.max_iterations {
            self.max_iterations = n.max(1);
        }
        if let Some(t) = options.temperature {
            self.temperature = t;
        }
        if let Some(tc) = options.tool_choice {
            self.tool_choice = Some(tc);
        }
        self.verbose = options.verbose;
    }

    /// Library settings for [`Agent::startup`](mcpbridge::Agent::startup).
    pub fn to_agent_config(&self) -> AgentConfig {
        AgentConfig {
            session: SessionConfig::default()
                .with_call_timeout(self.tool_call_timeout)
                .with_discovery_timeout(self.tool_call_timeout),
            orchestrator: OrchestratorConfig::default()
                .with_max_iterations(self.max_iterations)
                .with_retry(RetryPolicy::new(self.tool_retries, self.tool_retry_backoff))
                .with_verbose(self.verbose),
        }
    }
}

fn missing(msg: &str) -> Error {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string()))
}
