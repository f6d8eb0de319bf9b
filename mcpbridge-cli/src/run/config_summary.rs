//! Config summary printed to stderr when `--verbose` is on.

use std::io::Write;

use crate::config::{RunConfig, ToolSourceConfig};

/// Writes one line per section: MCP server, LLM, loop limits.
pub fn print_config_summary<W: Write>(config: &RunConfig, out: &mut W) -> std::io::Result<()> {
    let server = match &config.tool_source {
        ToolSourceConfig::Http { url, headers } => {
            let names: Vec<&str> = headers.iter().map(|(k, _)| k.as_str()).collect();
            format!("http {} (headers: [{}])", url, names.join(", "))
        }
        ToolSourceConfig::Stdio { command, args } => format!("stdio {} {}", command, args.join(" ")),
    };
    writeln!(out, "[config] mcp server: {}", server.trim_end())?;
    writeln!(
        out,
        "[config] llm: {} model={} endpoint={} temperature={} tool_choice={}",
        config.llm.backend_name(),
        config.llm.model(),
        config.llm.endpoint(),
        config.temperature,
        config
            .tool_choice
            .map(|tc| format!("{:?}", tc).to_lowercase())
            .unwrap_or_else(|| "auto".to_string()),
    )?;
    writeln!(
        out,
        "[config] loop: max_iterations={} tool_retries={} retry_backoff={:?} call_timeout={:?}",
        config.max_iterations, config.tool_retries, config.tool_retry_backoff, config.tool_call_timeout
    )?;
    Ok(())
}
