//! hoyolab-rss-feeds: binary entrypoint.
//! Parses the command line, sets up logging and runs one generation pass.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hoyolab_rss_feeds::app::{run, Cli};

/// `RUST_LOG` wins; otherwise info for everything.
/// With a log path, plain lines are appended to that file instead of stderr.
fn init_tracing(log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_path.as_deref())?;

    if let Err(e) = run(cli).await {
        tracing::error!(error = %format!("{e:#}"), "feed generation failed");
        return Err(e);
    }
    Ok(())
}
