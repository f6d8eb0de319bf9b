//! Run with a given config; does not read .env.
//!
//! Connects once with [`Agent::startup`], answers the one-shot message or runs the chat
//! loop on stdin, and always calls [`Agent::shutdown`], on Ctrl-C too.

use std::io::Write;

use mcpbridge::Agent;
use tokio::io::BufReader;

use crate::config::RunConfig;

use super::{banner, build_llm, chat_loop, print_config_summary, Error};

/// Connects to the configured MCP server and discovers its tools.
pub async fn startup(config: &RunConfig) -> Result<Agent, Error> {
    let target = config.tool_source.to_target();
    tracing::info!(target = %target, "connecting to MCP server");
    let agent = Agent::startup(&target, build_llm(config), config.to_agent_config()).await?;
    Ok(agent)
}

async fn answer_one<W: Write>(agent: &Agent, message: &str, out: &mut W) -> Result<(), Error> {
    let answer = agent.process_query(message).await?;
    writeln!(out, "\n{}", answer)?;
    Ok(())
}

/// Runs one message (`Some`) or the interactive loop (`None`) against a fresh session.
pub async fn run_with_config(config: &RunConfig, message: Option<&str>) -> Result<(), Error> {
    if config.verbose {
        print_config_summary(config, &mut std::io::stderr())?;
    }
    let agent = startup(config).await?;
    let mut out = std::io::stdout();
    writeln!(out, "\n{}", banner(&agent))?;

    let result = tokio::select! {
        r = async {
            match message {
                Some(m) => answer_one(&agent, m, &mut out).await,
                None => chat_loop(&agent, BufReader::new(tokio::io::stdin()), &mut out).await,
            }
        } => r,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted; shutting down");
            Ok(())
        }
    };

    agent.shutdown().await;
    result
}
