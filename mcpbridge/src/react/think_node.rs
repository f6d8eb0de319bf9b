//! Think node: ask the reasoning component for the next step.
//!
//! Reads `state.messages`, calls the LLM with the registry's tool specs, appends
//! one assistant message and sets `state.tool_calls` (empty means final answer).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::{ReActState, ToolCall};
use crate::tool_source::ToolSpec;

/// Think node: one ReAct step that produces an assistant message and optional tool_calls.
///
/// **Interaction**: Implements `Node<ReActState>`; consumes an `LlmClient`.
/// A `ReasoningUnavailable` error from the client ends the turn.
pub struct ThinkNode {
    llm: Arc<dyn LlmClient>,
    tools: Vec<ToolSpec>,
}

impl ThinkNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Vec<ToolSpec>) -> Self {
        Self { llm, tools }
    }
}

/// Assistant text kept in the conversation when the model only emitted calls.
fn describe_calls(calls: &[ToolCall]) -> String {
    calls
        .iter()
        .map(|c| format!("Calling tool {} with {}", c.name, c.arguments))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Node<ReActState> for ThinkNode {
    fn id(&self) -> &str {
        "think"
    }

    async fn run(&self, state: ReActState) -> Result<(ReActState, Next), AgentError> {
        let response = self.llm.invoke(&state.messages, &self.tools).await?;
        tracing::debug!(
            tool_calls = response.tool_calls.len(),
            content_len = response.content.len(),
            "reasoning step"
        );
        let mut state = state;
        let content = if response.content.trim().is_empty() && !response.tool_calls.is_empty() {
            describe_calls(&response.tool_calls)
        } else {
            response.content
        };
        state.messages.push(Message::Assistant(content));
        state.tool_calls = response.tool_calls;
        state.tool_results.clear();
        Ok((state, Next::Continue))
    }
}
