//! Optional overrides for a run (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). All fields are
//! optional; only set fields override the env-based config.

use mcpbridge::ToolChoiceMode;

/// Overrides for a run: server target, loop limit, sampling, verbosity.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Streamable HTTP URL of the MCP server. Wins over `command`.
    pub url: Option<String>,
    /// Command that starts the MCP server over stdio.
    pub command: Option<String>,
    /// Args for `command`.
    pub args: Vec<String>,
    pub max_iterations: Option<u32>,
    /// Override sampling temperature (0–2).
    pub temperature: Option<f32>,
    /// Override tool choice mode (auto, none, required).
    pub tool_choice: Option<ToolChoiceMode>,
    pub verbose: bool,
}
