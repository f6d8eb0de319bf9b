//! mcpbridge-cli library: configuration and run logic behind the `mcpbridge` binary.
//!
//! Reads the MCP server target and LLM settings from `.env` / env, connects once, answers
//! queries (one-shot or interactive) and disconnects on every exit path.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! mcpbridge_cli::run(Some("Show me all products")).await?;
//! ```

mod config;
mod logging;
mod run;

pub use config::{
    parse_headers, split_args, Error, LlmConfig, RunConfig, RunOptions, ToolSourceConfig,
    DEFAULT_AZURE_API_VERSION, DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND,
};
pub use logging::init_tracing;
pub use run::{
    banner, build_llm, chat_loop, print_config_summary, run, run_with_config, run_with_options,
    startup,
};

#[cfg(test)]
mod tests;
