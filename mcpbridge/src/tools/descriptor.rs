//! Immutable tool descriptor built from a discovered [`ToolSpec`].

use super::schema::{InputSchema, SchemaError};
use crate::tool_source::ToolSpec;

/// Declarative metadata of one remote tool. Created at discovery, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: InputSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Wire form handed to the reasoning component.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: if self.description.is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
            input_schema: self.input_schema.to_json(),
        }
    }
}

/// Why a discovered spec could not become a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("tool name must not be empty")]
    EmptyName,
    #[error("tool {name}: {source}")]
    Schema {
        name: String,
        #[source]
        source: SchemaError,
    },
}

impl TryFrom<ToolSpec> for ToolDescriptor {
    type Error = DescriptorError;

    fn try_from(spec: ToolSpec) -> Result<Self, Self::Error> {
        if spec.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        let input_schema = InputSchema::from_json(&spec.input_schema).map_err(|source| {
            DescriptorError::Schema {
                name: spec.name.clone(),
                source,
            }
        })?;
        Ok(Self {
            name: spec.name,
            description: spec.description.unwrap_or_default(),
            input_schema,
        })
    }
}
