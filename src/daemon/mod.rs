//! Background daemon that keeps the quote store in sync with the feed.
//!
//! # Architecture
//!
//! - **Sync loop**: syncs at startup and then every `sync_interval_secs`
//! - **Server**: answers IPC commands from the CLI (status, stop, stats, sync)
//! - **State**: PID file, socket path and log file
//!
//! Start it with `quotes daemon start`, stop it with `quotes daemon stop`.

pub mod server;
pub mod state;
pub mod sync;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::remote::RemoteClient;
use crate::storage::SqliteStorage;
use crate::store::QuoteStore;
use crate::sync::SyncManager;

pub use server::{send_command, send_command_sync, DaemonCommand, DaemonResponse};
pub use state::{DaemonState, DaemonStats};

/// Runs the daemon in the foreground until Ctrl+C or a stop command.
///
/// # Errors
///
/// Returns an error if another instance is running, the configuration or
/// database cannot be opened, or the runtime files cannot be written.
pub async fn run_daemon() -> Result<()> {
    let state = DaemonState::new()?;

    if state.is_running() {
        anyhow::bail!(
            "Daemon is already running (PID {})",
            state.get_pid().unwrap_or(0)
        );
    }

    let config = Config::load().context("Could not load config")?;
    let _guard = setup_logging(&state)?;

    tracing::info!("Starting quotesync daemon...");

    let pid = std::process::id();
    state.write_pid(pid)?;
    tracing::info!("Daemon started with PID {}", pid);

    let loaded = QuoteStore::load(
        Box::new(SqliteStorage::open_default()?),
        Box::new(SqliteStorage::open_volatile()?),
        config.dedup_key,
    );
    if let Some(e) = &loaded.recovered {
        tracing::warn!("{e}");
    }

    let manager = Arc::new(SyncManager::new(
        RemoteClient::with_url(&config.endpoint),
        Arc::new(Mutex::new(loaded.store)),
    ));
    let stats = Arc::new(RwLock::new(DaemonStats::default()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let (sync_tx, sync_rx) = mpsc::channel(8);

    let server_handle = {
        let stats = stats.clone();
        let socket_path = state.socket_path.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                server::run_server(&socket_path, stats, Some(stop_tx), sync_tx, shutdown_rx).await
            {
                tracing::error!("IPC server error: {}", e);
            }
        })
    };

    let tracker_handle = tokio::spawn(sync::track_sync_reports(
        manager.subscribe(),
        stats.clone(),
        shutdown_tx.subscribe(),
    ));

    let sync_handle = tokio::spawn(sync::run_periodic_sync(
        manager,
        Duration::from_secs(config.sync_interval_secs),
        sync_rx,
        shutdown_tx.subscribe(),
    ));

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = stop_rx => {
            tracing::info!("Received stop command, shutting down...");
        }
    }

    let _ = shutdown_tx.send(());
    tokio::time::sleep(Duration::from_millis(100)).await;

    server_handle.abort();
    tracker_handle.abort();
    sync_handle.abort();

    state.cleanup()?;
    tracing::info!("Daemon stopped");

    Ok(())
}

/// Sends daemon logs to `~/.quotesync/daemon.log` and to stderr.
///
/// The returned guard must stay alive while the daemon runs. If a global
/// subscriber is already installed it is left in place.
fn setup_logging(state: &DaemonState) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let file_appender = tracing_appender::rolling::never(
        state.log_file.parent().unwrap_or(std::path::Path::new(".")),
        state.log_file.file_name().unwrap_or_default(),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotesync=info,quotes=info".into()),
        )
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    Ok(guard)
}
