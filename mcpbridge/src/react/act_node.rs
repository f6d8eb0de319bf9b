//! Act node: run the proposed tool calls through the registry.
//!
//! For each call in `state.tool_calls`: look the tool up (a miss is an error
//! observation, nothing is invoked), parse the JSON arguments, invoke the
//! adapter under the [`RetryPolicy`], and append every attempt to the trace.
//! Calls run strictly one after another. Tool failures never leave this node as
//! errors; a lost session is recorded in `state.source_lost`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::session::Session;
use crate::state::{ReActState, ToolCall, ToolResult, TraceEntry};
use crate::tools::{InvocationResult, ToolRegistry};

use super::ellipsize;

/// How often a failed invocation is repeated before it becomes an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Act node: executes tool_calls against the registry and produces tool_results.
///
/// **Interaction**: Implements `Node<ReActState>`; reads `ReActState::tool_calls`,
/// writes `tool_results`, `trace` and `source_lost`.
pub struct ActNode {
    registry: Arc<ToolRegistry>,
    session: Arc<Session>,
    retry: RetryPolicy,
}

impl ActNode {
    pub fn new(registry: Arc<ToolRegistry>, session: Arc<Session>) -> Self {
        Self {
            registry,
            session,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn error_result(tc: &ToolCall, content: String) -> ToolResult {
        ToolResult {
            call_id: tc.id.clone(),
            name: tc.name.clone(),
            content,
            is_error: true,
        }
    }

    /// Invokes one adapter, retrying failures while the session stays Ready.
    async fn invoke_with_retry(
        &self,
        tc: &ToolCall,
        args: Value,
        trace: &mut Vec<TraceEntry>,
    ) -> InvocationResult {
        let Some(adapter) = self.registry.get(&tc.name) else {
            // Checked by the caller.
            return InvocationResult::Failure(format!("tool '{}' is not available", tc.name));
        };
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(tool = %tc.name, args = %args, attempt, "calling tool");
            let result = adapter.invoke(args.clone()).await;
            trace.push(TraceEntry {
                tool: tc.name.clone(),
                arguments: args.clone(),
                result: result.clone(),
                attempt,
            });
            match &result {
                InvocationResult::Success(content) => {
                    trace!(
                        tool = %tc.name,
                        result_len = content.text.len(),
                        result_preview = %ellipsize(&content.text, 200),
                        "tool returned"
                    );
                    return result;
                }
                InvocationResult::Failure(reason) => {
                    warn!(tool = %tc.name, error = %reason, attempt, "tool call failed");
                    if attempt >= self.retry.max_attempts() || !self.session.is_ready() {
                        return result;
                    }
                    if !self.retry.backoff.is_zero() {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Node<ReActState> for ActNode {
    fn id(&self) -> &str {
        "act"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let mut state = state;
        let mut tool_results = Vec::with_capacity(state.tool_calls.len());

        for tc in &state.tool_calls {
            if state.source_lost.is_some() {
                break;
            }
            if !self.registry.contains(&tc.name) {
                warn!(tool = %tc.name, "reasoning component proposed an unknown tool");
                tool_results.push(Self::error_result(
                    tc,
                    format!(
                        "Error: tool '{}' is not available. Available tools: {}",
                        tc.name,
                        self.registry.names().join(", ")
                    ),
                ));
                continue;
            }
            let args: Value = if tc.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                match serde_json::from_str(&tc.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        tool_results.push(Self::error_result(
                            tc,
                            format!("Error: arguments for '{}' are not valid JSON: {}", tc.name, e),
                        ));
                        continue;
                    }
                }
            };

            let result = self.invoke_with_retry(tc, args, &mut state.trace).await;
            tool_results.push(ToolResult {
                call_id: tc.id.clone(),
                name: tc.name.clone(),
                content: result.observation(),
                is_error: !result.is_success(),
            });

            if !self.session.is_ready() {
                let reason = match &result {
                    InvocationResult::Failure(r) => r.clone(),
                    InvocationResult::Success(_) => format!("session is {}", self.session.state()),
                };
                warn!(reason = %reason, "data source became unavailable during the turn");
                state.source_lost = Some(reason);
            }
        }

        state.tool_results = tool_results;
        Ok((state, Next::Continue))
    }
}
