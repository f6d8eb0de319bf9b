//! Tool adapter: one descriptor plus a weak handle on the session.

use std::sync::{Arc, Weak};

use serde_json::Value;

use super::{InvocationRequest, InvocationResult, ToolDescriptor};
use crate::session::Session;
use crate::tool_source::ToolSpec;

/// Uniform callable wrapping one remote tool.
///
/// Holds the session weakly: once the session is dropped or leaves Ready,
/// [`invoke`](Self::invoke) returns `Failure` immediately. Every error is
/// converted to `Failure`; nothing escapes.
pub struct ToolAdapter {
    descriptor: ToolDescriptor,
    session: Weak<Session>,
}

impl ToolAdapter {
    pub fn new(descriptor: ToolDescriptor, session: &Arc<Session>) -> Self {
        Self {
            descriptor,
            session: Arc::downgrade(session),
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn description(&self) -> &str {
        self.descriptor.description()
    }

    pub fn input_schema(&self) -> &super::InputSchema {
        self.descriptor.input_schema()
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Spec handed to the reasoning component.
    pub fn spec(&self) -> ToolSpec {
        self.descriptor.to_spec()
    }

    /// Checks `arguments` against the declared schema, then issues exactly one call.
    pub async fn invoke(&self, arguments: Value) -> InvocationResult {
        let request = match InvocationRequest::new(self.name(), arguments) {
            Ok(r) => r,
            Err(reason) => return InvocationResult::Failure(reason),
        };
        if let Err(reason) = self.input_schema().check(&request.arguments_value()) {
            tracing::debug!(tool = %self.name(), reason = %reason, "arguments rejected by schema");
            return InvocationResult::Failure(format!("invalid arguments: {}", reason));
        }
        let Some(session) = self.session.upgrade() else {
            return InvocationResult::Failure("session closed".to_string());
        };
        match session.call(&request).await {
            Ok(content) => InvocationResult::Success(content),
            Err(e) => {
                tracing::debug!(tool = %self.name(), error = %e, "tool invocation failed");
                InvocationResult::Failure(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAdapter")
            .field("name", &self.name())
            .field("session_alive", &(self.session.strong_count() > 0))
            .finish()
    }
}
