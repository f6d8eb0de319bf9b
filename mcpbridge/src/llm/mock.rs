//! Scripted LLM client for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LlmClient, LlmResponse};
use crate::error::AgentError;
use crate::message::Message;
use crate::tool_source::ToolSpec;

type ResponderFn = Arc<dyn Fn(&[Message], &[ToolSpec]) -> Result<LlmResponse, AgentError> + Send + Sync>;

enum Script {
    /// Responses in order; the last one repeats once the queue is drained.
    Sequence(Mutex<VecDeque<LlmResponse>>, LlmResponse),
    Responder(ResponderFn),
    Unavailable(String),
}

/// Mock LLM: returns scripted responses and counts calls.
pub struct MockLlm {
    script: Script,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl MockLlm {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Returns `responses` in order, then keeps returning the last one.
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        let last = responses.last().cloned().unwrap_or_default();
        Self::with_script(Script::Sequence(Mutex::new(responses.into()), last))
    }

    /// Always answers `content` without tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new(vec![LlmResponse::answer(content)])
    }

    /// Computes each response from the conversation so far.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[Message], &[ToolSpec]) -> Result<LlmResponse, AgentError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Responder(Arc::new(f)))
    }

    /// Every call fails with `ReasoningUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_script(Script::Unavailable(reason.into()))
    }

    /// Number of `invoke` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent `invoke`.
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        match &self.script {
            Script::Sequence(queue, last) => Ok(queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| last.clone())),
            Script::Responder(f) => f(messages, tools),
            Script::Unavailable(reason) => Err(AgentError::ReasoningUnavailable(reason.clone())),
        }
    }
}
