//! Registry of adapted tools, populated once per session.

use std::collections::HashMap;
use std::sync::Arc;

use super::{DescriptorError, ToolAdapter, ToolDescriptor};
use crate::session::Session;
use crate::tool_source::ToolSpec;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Read-only set of [`ToolAdapter`]s, in discovery order, with unique names.
///
/// Built atomically: either every discovered spec becomes an adapter or no
/// registry exists.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    adapters: Vec<ToolAdapter>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Converts every spec into a descriptor and wraps it for `session`.
    pub fn from_specs(specs: Vec<ToolSpec>, session: &Arc<Session>) -> Result<Self, RegistryError> {
        let descriptors = specs
            .into_iter()
            .map(ToolDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_descriptors(descriptors, session)
    }

    pub fn from_descriptors(
        descriptors: Vec<ToolDescriptor>,
        session: &Arc<Session>,
    ) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        let mut adapters = Vec::with_capacity(descriptors.len());
        for (i, d) in descriptors.into_iter().enumerate() {
            if index.insert(d.name().to_string(), i).is_some() {
                return Err(RegistryError::DuplicateName(d.name().to_string()));
            }
            adapters.push(ToolAdapter::new(d, session));
        }
        Ok(Self { adapters, index })
    }

    pub fn get(&self, name: &str) -> Option<&ToolAdapter> {
        self.index.get(name).map(|&i| &self.adapters[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolAdapter> {
        self.adapters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Specs for the reasoning component, in discovery order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.adapters.iter().map(ToolAdapter::spec).collect()
    }
}
