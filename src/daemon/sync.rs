//! Periodic sync for the daemon.
//!
//! Runs a sync immediately on startup and then on a fixed interval. Timer
//! ticks and IPC requests both go through [`SyncManager::sync`], whose
//! single-flight guard turns overlapping triggers into skips.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};

use super::state::DaemonStats;
use crate::remote::QuoteSource;
use crate::sync::{SyncManager, SyncReport};

/// Runs syncs until `shutdown_rx` fires, then aborts any sync in flight.
pub async fn run_periodic_sync<S: QuoteSource + 'static>(
    manager: Arc<SyncManager<S>>,
    every: Duration,
    mut triggers: mpsc::Receiver<oneshot::Sender<SyncReport>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    // The first tick completes at once, which gives the startup sync.
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut running = JoinSet::new();

    tracing::info!("Periodic sync every {}s", every.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let manager = manager.clone();
                running.spawn(async move {
                    manager.sync().await;
                });
            }
            Some(reply) = triggers.recv() => {
                let manager = manager.clone();
                running.spawn(async move {
                    let report = manager.sync().await;
                    let _ = reply.send(report);
                });
            }
            Some(joined) = running.join_next(), if !running.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!("Sync task panicked: {e}");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Periodic sync shutting down");
                break;
            }
        }
    }

    running.abort_all();
}

/// Folds every sync completion signal into the daemon statistics.
pub async fn track_sync_reports(
    mut reports: broadcast::Receiver<SyncReport>,
    stats: Arc<RwLock<DaemonStats>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = reports.recv() => match received {
                Ok(report) => stats.write().await.record(&report),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("Missed {missed} sync report(s)");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown_rx.recv() => break,
        }
    }
}
