//! Discovered tools: typed schema, descriptor, adapter and registry.
//!
//! Discovery turns each remote [`ToolSpec`](crate::tool_source::ToolSpec) into a
//! [`ToolDescriptor`] (schema validated once), wraps it in a [`ToolAdapter`] and
//! publishes the set as a [`ToolRegistry`].

mod adapter;
mod descriptor;
mod registry;
pub mod schema;

pub use adapter::ToolAdapter;
pub use descriptor::{DescriptorError, ToolDescriptor};
pub use registry::{RegistryError, ToolRegistry};
pub use schema::{InputSchema, ParamKind, ParamSpec, SchemaError};

use serde_json::{Map, Value};

use crate::tool_source::ToolCallContent;

/// One call attempt: tool name and argument object.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    /// `null` arguments mean "no arguments"; anything but an object is rejected.
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Result<Self, String> {
        let arguments = match arguments {
            Value::Null => Map::new(),
            Value::Object(m) => m,
            other => return Err(format!("arguments must be a JSON object, got {}", other)),
        };
        Ok(Self {
            tool_name: tool_name.into(),
            arguments,
        })
    }

    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

/// Outcome of one invocation. Exactly one variant carries data.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success(ToolCallContent),
    Failure(String),
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Text fed back to the reasoning component.
    pub fn observation(&self) -> String {
        match self {
            Self::Success(c) => c.text.clone(),
            Self::Failure(reason) => format!("Error: {}", reason),
        }
    }
}
