//! Per-turn ReAct state and the turn record returned to callers.
//!
//! Each turn owns one [`ReActState`]; nodes take it by value and hand back the
//! updated copy. Nothing in here is shared between turns.

use serde_json::Value;

use crate::message::Message;
use crate::tools::InvocationResult;

/// A tool call proposed by the reasoning component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// JSON-encoded arguments as produced by the model.
    pub arguments: String,
    /// Provider call id, when the backend assigns one.
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            id: None,
        }
    }
}

/// Observation for one tool call of the current round.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: Option<String>,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

/// One real invocation: which tool, with what arguments, and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub tool: String,
    pub arguments: Value,
    pub result: InvocationResult,
    /// 1 for the first attempt, higher for retries.
    pub attempt: u32,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reasoning component produced a final answer.
    Answered,
    /// The iteration limit was reached; the answer is a summary of the trace.
    IterationLimit,
    /// The session was lost mid-turn.
    SourceUnavailable,
}

/// State flowing through think → act → observe.
#[derive(Debug, Clone, Default)]
pub struct ReActState {
    pub messages: Vec<Message>,
    /// Calls proposed by the last think step.
    pub tool_calls: Vec<ToolCall>,
    /// Observations from the last act step.
    pub tool_results: Vec<ToolResult>,
    /// Every invocation of the turn, in order.
    pub trace: Vec<TraceEntry>,
    /// Completed act/observe rounds.
    pub turn_count: u32,
    pub final_answer: Option<String>,
    pub outcome: Option<TurnOutcome>,
    /// Set by the act step when the session stopped being Ready.
    pub source_lost: Option<String>,
}

impl ReActState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Content of the last assistant message, if any.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

/// One processed query.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub query: String,
    pub trace: Vec<TraceEntry>,
    pub final_answer: String,
    pub outcome: TurnOutcome,
    /// Act/observe rounds run.
    pub iterations: u32,
}

impl ConversationTurn {
    /// Tool names in invocation order.
    pub fn invoked_tools(&self) -> Vec<&str> {
        self.trace.iter().map(|e| e.tool.as_str()).collect()
    }
}
