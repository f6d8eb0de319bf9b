//! Reasoning component abstraction for the Think node.
//!
//! ThinkNode hands the conversation and the available tool specs to an
//! [`LlmClient`] and gets back assistant text plus optional tool calls. This
//! module defines the trait, a scripted [`MockLlm`] and, behind feature
//! `openai`, [`ChatOpenAI`] (OpenAI or Azure OpenAI via `async-openai`).

mod mock;

/// How the model may use the offered tools. Parsed from `auto`, `none` or `required`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    #[default]
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            other => Err(format!("unsupported tool choice '{}'", other)),
        }
    }
}

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tool_source::ToolSpec;

/// Response from one completion: assistant text and the tool calls it requests.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; ThinkNode appends `content`
/// as an assistant message and stores `tool_calls` in `ReActState::tool_calls`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Empty means the model answered; observe → END.
    pub tool_calls: Vec<ToolCall>,
}

/// What the reasoning component proposed.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    FinalAnswer(String),
    ToolCalls(Vec<ToolCall>),
}

impl LlmResponse {
    /// Final answer with no tool calls.
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A single tool call with JSON arguments.
    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            content: String::new(),
            tool_calls: vec![ToolCall::new(name, arguments.to_string())],
        }
    }

    pub fn proposal(&self) -> Proposal {
        if self.tool_calls.is_empty() {
            Proposal::FinalAnswer(self.content.clone())
        } else {
            Proposal::ToolCalls(self.tool_calls.clone())
        }
    }
}

/// Reasoning component: given messages and tools, propose an answer or tool calls.
///
/// Implementations: [`MockLlm`] (scripted), `ChatOpenAI` (feature `openai`).
/// An unreachable backend must be reported as [`AgentError::ReasoningUnavailable`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_choice_mode_from_str() {
        assert_eq!("AUTO".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Auto);
        assert_eq!("required".parse::<ToolChoiceMode>().unwrap(), ToolChoiceMode::Required);
        assert!("sometimes".parse::<ToolChoiceMode>().is_err());
    }

    /// **Scenario**: No tool calls is a final answer; any tool call is a ToolCalls proposal.
    #[test]
    fn proposal_from_response() {
        assert_eq!(
            LlmResponse::answer("done").proposal(),
            Proposal::FinalAnswer("done".into())
        );
        match LlmResponse::tool_call("list_products", json!({})).proposal() {
            Proposal::ToolCalls(calls) => assert_eq!(calls[0].name, "list_products"),
            other => panic!("expected tool calls, got {:?}", other),
        }
    }
}
