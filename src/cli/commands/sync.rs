//! Sync command - fetch quotes from the feed and merge them now.
//!
//! When the daemon is running the request goes through it, so its
//! single-flight guard also covers manual syncs. Otherwise the sync runs
//! in this process.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::daemon::{send_command_sync, DaemonCommand, DaemonResponse, DaemonState};
use quotesync::remote::RemoteClient;
use quotesync::sync::{SyncManager, SyncOutcome, SyncReport};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::cli::{open_store, runtime};

#[derive(clap::Args)]
pub struct Args {
    /// Run in this process even if the daemon is running
    #[arg(long)]
    pub local: bool,
}

/// Executes the sync command.
pub fn run(args: Args) -> Result<()> {
    let state = DaemonState::new()?;

    let report = if !args.local && state.is_running() {
        match send_command_sync(&state.socket_path, DaemonCommand::Sync) {
            Ok(DaemonResponse::Synced(report)) => report,
            Ok(DaemonResponse::Error { message }) => anyhow::bail!("Daemon sync failed: {message}"),
            Ok(other) => anyhow::bail!("Unexpected response from daemon: {other:?}"),
            Err(e) => {
                tracing::debug!("Daemon unreachable, syncing locally: {e}");
                sync_locally()?
            }
        }
    } else {
        sync_locally()?
    };

    print_report(&report);
    Ok(())
}

fn sync_locally() -> Result<SyncReport> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let manager = SyncManager::new(
        RemoteClient::with_url(&config.endpoint),
        Arc::new(Mutex::new(store)),
    );
    Ok(runtime()?.block_on(manager.sync()))
}

fn print_report(report: &SyncReport) {
    match &report.outcome {
        SyncOutcome::Merged { fetched, added } => {
            println!("{}", "Quotes synced with server!".green());
            println!("  {} {}", "Fetched:".dimmed(), fetched);
            println!("  {} {}", "New:".dimmed(), added);
        }
        SyncOutcome::Failed { error } => {
            println!("{} {}", "Sync failed:".yellow(), error);
            println!("{}", "Your local quotes are unchanged.".dimmed());
        }
        SyncOutcome::Skipped => {
            println!("{}", "A sync is already in progress.".yellow());
        }
    }
}
