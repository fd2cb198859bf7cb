//! pollwatch - watch a file or directory for changes by polling
//!
//! Prints every batch of changes to stdout until interrupted with Ctrl+C.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::Parser;
use pollwatch::report::write_batch;
use pollwatch_core::config::Config;
use pollwatch_watcher::{CancellationToken, PollWatcher};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pollwatch")]
#[command(about = "Watch a file or directory for changes by polling")]
#[command(version)]
struct Cli {
    /// File or directory to watch
    path: PathBuf,

    /// Watch files in subdirectories recursively
    #[arg(short, long)]
    recurse: bool,

    /// How often to check for modifications, in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if cli.recurse {
        config.watcher.recursive = true;
    }
    if let Some(ms) = cli.interval_ms {
        config.watcher.interval_ms = ms;
    }

    let watcher = PollWatcher::new(config.watcher).context("Invalid watcher configuration")?;
    let cancel = CancellationToken::new();
    let mut batches = watcher
        .watch(&cli.path, cancel.clone())
        .await
        .with_context(|| format!("Failed to watch {}", cli.path.display()))?;

    tokio::spawn(cancel_on_ctrl_c(cancel));

    while let Some(batch) = batches.recv().await {
        let mut out = io::stdout().lock();
        write_batch(&mut out, &batch).context("Failed to write report")?;
        out.flush().context("Failed to flush stdout")?;
    }

    debug!("Batch stream closed");
    Ok(())
}

/// Initialize logging system
///
/// Logs go to stderr so stdout only carries the change report.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={level},pollwatch_watcher={level},pollwatch_core={level}",
            env!("CARGO_CRATE_NAME")
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, stopping watch");
            cancel.cancel();
        }
        Err(e) => {
            error!("Error setting up signal handler: {e}");
        }
    }
}
