//! Configuration for a CLI run.
//!
//! Re-exports [`RunConfig`], [`RunOptions`], [`LlmConfig`], [`ToolSourceConfig`] and config [`Error`].

mod llm_config;
mod run_config;
mod run_options;
mod tool_source_config;

pub use llm_config::{LlmConfig, DEFAULT_AZURE_API_VERSION};
pub use run_config::{Error, RunConfig};
pub use run_options::RunOptions;
pub use tool_source_config::{
    parse_headers, split_args, ToolSourceConfig, DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND,
};
