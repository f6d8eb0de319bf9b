//! Tracing setup: human-readable logs on stderr so answers on stdout stay clean.
//!
//! Filter from `RUST_LOG` (default `info`, `--verbose` forces `debug`). When env `LOG_FILE`
//! is set, logs are also appended there without ANSI colors.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Error;

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug,hyper=info,reqwest=info");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Fails if one is already installed or `LOG_FILE` cannot be opened.
pub fn init_tracing(verbose: bool) -> Result<(), Error> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_filter(filter(verbose));
    let registry = tracing_subscriber::registry().with(stderr_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_filter(filter(verbose));
        registry.with(file_layer).try_init()?;
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.try_init()?;
    }
    Ok(())
}
