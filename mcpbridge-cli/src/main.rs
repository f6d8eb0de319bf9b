//! mcpbridge binary: parse flags, load `.env`, then chat with the MCP server's tools.

use clap::Parser;
use mcpbridge::ToolChoiceMode;
use mcpbridge_cli::{init_tracing, run_with_options, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "mcpbridge")]
#[command(about = "Ask questions answered by an LLM using the tools of an MCP server")]
struct Args {
    /// Answer this one message and exit (otherwise start the interactive loop)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Streamable HTTP URL of the MCP server (overrides MCP_SERVER_URL)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Command that starts the MCP server over stdio (overrides MCP_SERVER_COMMAND)
    #[arg(long, value_name = "CMD", conflicts_with = "url")]
    command: Option<String>,

    /// Argument for --command; repeat for more
    #[arg(long = "arg", value_name = "ARG", requires = "command", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Act/observe rounds per query (overrides MAX_ITERATIONS)
    #[arg(long, value_name = "N")]
    max_iterations: Option<u32>,

    /// Sampling temperature (overrides OPENAI_TEMPERATURE)
    #[arg(long)]
    temperature: Option<f32>,

    /// auto, none or required (overrides OPENAI_TOOL_CHOICE)
    #[arg(long, value_name = "MODE")]
    tool_choice: Option<ToolChoiceMode>,

    /// Debug logs and config summary on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_options(&self) -> RunOptions {
        RunOptions {
            url: self.url.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            max_iterations: self.max_iterations,
            temperature: self.temperature,
            tool_choice: self.tool_choice,
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();
    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("warning: could not initialize logging: {}", e);
    }

    let message = args.message.as_deref().map(str::trim).filter(|m| !m.is_empty());
    if let Err(e) = run_with_options(message, &args.to_options()).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
