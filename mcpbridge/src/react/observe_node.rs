//! Observe node: feed tool results back and decide whether the turn is over.
//!
//! - No tool calls in this round: the last assistant message is the final answer.
//! - Session lost during act: end with a "data source unavailable" answer.
//! - Iteration limit reached: end with a summary of the trace.
//! - Otherwise: jump back to `think`.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::{ReActState, TraceEntry, TurnOutcome};
use crate::tools::InvocationResult;

use super::ellipsize;

/// Answer used when the reasoning component returns an empty final message.
pub const NO_RESPONSE: &str = "No response generated";

const SUMMARY_ITEM_CHARS: usize = 500;

/// Observe node: closes one act/observe round.
pub struct ObserveNode {
    max_iterations: u32,
}

impl ObserveNode {
    /// `max_iterations` is clamped to at least 1.
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
        }
    }
}

fn summarize_entry(e: &TraceEntry) -> String {
    match &e.result {
        InvocationResult::Success(c) => {
            format!("- {}({}): {}", e.tool, e.arguments, ellipsize(&c.text, SUMMARY_ITEM_CHARS))
        }
        InvocationResult::Failure(reason) => format!("- {}({}) failed: {}", e.tool, e.arguments, reason),
    }
}

/// Best-effort answer built from the trace when the loop is cut off.
pub(crate) fn summarize_trace(trace: &[TraceEntry], iterations: u32) -> String {
    if trace.is_empty() {
        return format!(
            "I could not reach a final answer within {} reasoning steps, and no tool returned data.",
            iterations
        );
    }
    let mut out = format!(
        "I could not reach a final answer within {} reasoning steps. Here is what the tools returned:",
        iterations
    );
    for e in trace {
        out.push('\n');
        out.push_str(&summarize_entry(e));
    }
    out
}

fn source_unavailable_answer(reason: &str, trace: &[TraceEntry]) -> String {
    let mut out = format!(
        "The data source is unavailable ({}), so I cannot complete this request.",
        reason
    );
    let gathered: Vec<String> = trace
        .iter()
        .filter(|e| e.result.is_success())
        .map(summarize_entry)
        .collect();
    if !gathered.is_empty() {
        out.push_str(" Results gathered before the connection was lost:");
        for g in gathered {
            out.push('\n');
            out.push_str(&g);
        }
    }
    out
}

#[async_trait]
impl Node<ReActState> for ObserveNode {
    fn id(&self) -> &str {
        "observe"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let mut state = state;

        if state.tool_calls.is_empty() {
            let answer = state
                .last_assistant_reply()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(NO_RESPONSE)
                .to_string();
            state.final_answer = Some(answer);
            state.outcome = Some(TurnOutcome::Answered);
            return Ok((state, Next::End));
        }

        for r in std::mem::take(&mut state.tool_results) {
            state
                .messages
                .push(Message::User(format!("Observation from {}: {}", r.name, r.content)));
        }
        state.tool_calls.clear();
        state.turn_count += 1;

        if let Some(reason) = state.source_lost.clone() {
            state.final_answer = Some(source_unavailable_answer(&reason, &state.trace));
            state.outcome = Some(TurnOutcome::SourceUnavailable);
            return Ok((state, Next::End));
        }

        if state.turn_count >= self.max_iterations {
            tracing::info!(iterations = state.turn_count, "iteration limit reached; summarizing trace");
            state.final_answer = Some(summarize_trace(&state.trace, state.turn_count));
            state.outcome = Some(TurnOutcome::IterationLimit);
            return Ok((state, Next::End));
        }

        Ok((state, Next::Node("think".to_string())))
    }
}
