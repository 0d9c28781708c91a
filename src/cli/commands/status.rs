//! Status command - show store, sync and daemon state.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::daemon::DaemonState;
use quotesync::storage::db::default_db_path;
use quotesync::sync::SyncState;

use crate::cli::open_store;

/// Executes the status command.
pub fn run() -> Result<()> {
    let config = Config::load()?;
    let mut store = open_store(&config)?;

    println!("{}", "quotesync".bold().cyan());
    println!();

    println!("{}", "Store:".bold());
    println!("  Quotes:             {}", store.len());
    println!("  Categories:         {}", store.categories().len());
    println!("  Selected category:  {}", store.selected_category());
    println!("  Database:           {}", default_db_path()?.display());

    let sync = SyncState::load(store.persistent_mut());
    println!();
    println!("{}", "Sync:".bold());
    println!("  Endpoint:           {}", config.endpoint);
    match (sync.last_sync_at, sync.last_sync_success) {
        (Some(at), Some(true)) => println!(
            "  Last sync:          {} ({} new)",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            sync.last_sync_count.unwrap_or(0)
        ),
        (Some(at), _) => println!(
            "  Last sync:          {} {}",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            format!("failed: {}", sync.last_error.as_deref().unwrap_or("unknown error")).red()
        ),
        (None, _) => println!("  Last sync:          {}", "never".dimmed()),
    }

    let daemon = DaemonState::new()?;
    println!();
    println!("{}", "Daemon:".bold());
    if daemon.is_running() {
        println!(
            "  {} (PID {}), syncing every {}s",
            "running".green(),
            daemon.get_pid().unwrap_or(0),
            config.sync_interval_secs
        );
    } else {
        println!("  {}", "not running".dimmed());
        println!();
        println!(
            "{}",
            "Hint: Run 'quotes daemon start' to sync in the background".yellow()
        );
    }

    Ok(())
}
