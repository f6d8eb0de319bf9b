//! Interactive loop: read a query per line, print the answer, stop on `quit` or EOF.

use std::io::Write;

use mcpbridge::Agent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::Error;

/// Line printed after startup, listing `name: description` for every discovered tool.
pub fn banner(agent: &Agent) -> String {
    let tools: Vec<String> = agent
        .registry()
        .iter()
        .map(|a| format!("{}: {}", a.name(), a.description()))
        .collect();
    format!("Connected to server with tools: {:?}", tools)
}

/// Reads queries from `input` until `quit` (any case) or EOF, writing answers to `out`.
///
/// Failed queries are reported and the loop continues, except when the data source is
/// gone: then the error is returned so the caller can shut down.
pub async fn chat_loop<R, W>(agent: &Agent, input: R, out: &mut W) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "\nMCP Client Started!")?;
    writeln!(out, "Type your queries or 'quit' to exit.")?;
    let mut lines = input.lines();
    loop {
        write!(out, "\nQuery: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            return Ok(());
        }
        match agent.process_query(query).await {
            Ok(answer) => writeln!(out, "\n{}", answer)?,
            Err(e) => {
                writeln!(out, "\nError: {}", e)?;
                if e.is_source_unavailable() {
                    return Err(Box::new(e));
                }
            }
        }
    }
}
