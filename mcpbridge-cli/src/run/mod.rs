//! Run entry points: connect, answer one message or chat interactively, disconnect.
//!
//! Re-exports [`run`], [`run_with_options`], [`run_with_config`], [`chat_loop`] and [`Error`].

pub use crate::config::Error;

mod chat;
mod config_summary;
mod run_with_config;

use std::sync::Arc;

use async_openai::config::{Config, OpenAIConfig};
use mcpbridge::{ChatOpenAI, LlmClient};

use crate::config::{LlmConfig, RunConfig, RunOptions};

pub use chat::{banner, chat_loop};
pub use config_summary::print_config_summary;
pub use run_with_config::{run_with_config, startup};

/// Run with config from `.env` / env; `message` answers one query, `None` starts the chat loop.
pub async fn run(message: Option<&str>) -> Result<(), Error> {
    run_with_options(message, &RunOptions::default()).await
}

/// Run with env config plus overrides (e.g. from CLI flags).
pub async fn run_with_options(message: Option<&str>, options: &RunOptions) -> Result<(), Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    run_with_config(&config, message).await
}

fn tune<C: Config>(llm: ChatOpenAI<C>, config: &RunConfig) -> ChatOpenAI<C> {
    let llm = llm.with_temperature(config.temperature);
    match config.tool_choice {
        Some(tc) => llm.with_tool_choice(tc),
        None => llm,
    }
}

/// Builds the chat completions client for the configured backend.
pub fn build_llm(config: &RunConfig) -> Arc<dyn LlmClient> {
    match &config.llm {
        LlmConfig::OpenAi {
            api_base,
            api_key,
            model,
        } => {
            let openai_config = OpenAIConfig::new()
                .with_api_base(api_base)
                .with_api_key(api_key.clone());
            Arc::new(tune(ChatOpenAI::with_config(openai_config, model.clone()), config))
        }
        LlmConfig::Azure {
            endpoint,
            api_key,
            deployment,
            api_version,
        } => Arc::new(tune(
            ChatOpenAI::azure(endpoint.clone(), api_key.clone(), deployment.clone(), api_version.clone()),
            config,
        )),
    }
}
