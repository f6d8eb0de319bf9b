//! Reasoning component backend: OpenAI-compatible endpoint or an Azure OpenAI deployment.
//!
//! Built from env by [`RunConfig::from_env`](super::RunConfig::from_env); turned into a
//! library [`ChatOpenAI`](mcpbridge::ChatOpenAI) by [`build_llm`](crate::run::build_llm).

/// Default Azure OpenAI API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Chat completions backend.
#[derive(Clone, Debug, PartialEq)]
pub enum LlmConfig {
    OpenAi {
        /// API base URL, e.g. `https://api.openai.com/v1`.
        api_base: String,
        api_key: String,
        /// Model name, e.g. `gpt-4o-mini`.
        model: String,
    },
    Azure {
        /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

impl LlmConfig {
    /// Model or deployment name, for display.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } => model,
            Self::Azure { deployment, .. } => deployment,
        }
    }

    /// Endpoint, for display.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::OpenAi { api_base, .. } => api_base,
            Self::Azure { endpoint, .. } => endpoint,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Azure { .. } => "azure",
        }
    }
}
