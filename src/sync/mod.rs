//! Fetch-and-merge synchronization with the remote feed.
//!
//! [`SyncManager`] runs one sync at a time. A trigger that arrives while a
//! sync is in flight is skipped rather than queued, so two fetches never
//! race to merge the same remote quotes. Every finished attempt is
//! broadcast as a [`SyncReport`], which is how the daemon learns that a
//! sync completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::remote::QuoteSource;
use crate::storage::Storage;
use crate::store::QuoteStore;

/// Persistent key holding the [`SyncState`] JSON.
pub const SYNC_STATE_KEY: &str = "quotesync.syncState";

/// Default interval between automatic syncs (300 000 ms).
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// A store shared between the sync task and its other users.
pub type SharedStore = Arc<Mutex<QuoteStore>>;

/// What a single sync attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Remote quotes were fetched and merged.
    Merged { fetched: usize, added: usize },
    /// Fetch or merge failed; the store is unchanged.
    Failed { error: String },
    /// Another sync was already running.
    Skipped,
}

/// Completion signal for one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    fn now(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            finished_at: Utc::now(),
        }
    }
}

/// Persisted summary of the most recent sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// When the last sync finished (successfully or not).
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Whether the last sync was successful.
    pub last_sync_success: Option<bool>,
    /// Number of quotes added by the last sync.
    pub last_sync_count: Option<usize>,
    /// Error message of the last failed sync.
    pub last_error: Option<String>,
}

impl SyncState {
    /// Loads the sync state, or the default if none was saved or it is
    /// unreadable.
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get(SYNC_STATE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse sync state: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read sync state: {e}");
                Self::default()
            }
        }
    }

    /// Saves the sync state.
    pub fn save(&self, storage: &mut dyn Storage) -> anyhow::Result<()> {
        let content = serde_json::to_string(self)?;
        storage.set(SYNC_STATE_KEY, &content)?;
        Ok(())
    }

    /// Updates the state from a finished report. Skipped runs change nothing.
    pub fn record(&mut self, report: &SyncReport) {
        match &report.outcome {
            SyncOutcome::Merged { added, .. } => {
                self.last_sync_at = Some(report.finished_at);
                self.last_sync_success = Some(true);
                self.last_sync_count = Some(*added);
                self.last_error = None;
            }
            SyncOutcome::Failed { error } => {
                self.last_sync_at = Some(report.finished_at);
                self.last_sync_success = Some(false);
                self.last_sync_count = Some(0);
                self.last_error = Some(error.clone());
            }
            SyncOutcome::Skipped => {}
        }
    }
}

/// Runs fetch + merge cycles against a shared store, one at a time.
pub struct SyncManager<S: QuoteSource> {
    source: S,
    store: SharedStore,
    in_flight: Mutex<()>,
    events: broadcast::Sender<SyncReport>,
}

impl<S: QuoteSource> SyncManager<S> {
    pub fn new(source: S, store: SharedStore) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            source,
            store,
            in_flight: Mutex::new(()),
            events,
        }
    }

    /// Receives a [`SyncReport`] after every attempt.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncReport> {
        self.events.subscribe()
    }

    /// Fetches remote quotes and merges them into the store.
    ///
    /// Never fails: errors are logged and reported as
    /// [`SyncOutcome::Failed`]. Returns [`SyncOutcome::Skipped`] at once if
    /// another sync holds the in-flight guard.
    pub async fn sync(&self) -> SyncReport {
        let Ok(guard) = self.in_flight.try_lock() else {
            tracing::debug!("Sync already in progress, skipping");
            return self.emit(SyncReport::now(SyncOutcome::Skipped));
        };

        // The store lock is not held across the fetch.
        let fetched = self.source.fetch_quotes().await;

        let mut store = self.store.lock().await;
        let outcome = match fetched {
            Ok(remote) => {
                let fetched = remote.len();
                match store.reload() {
                    Ok(recovered) => {
                        if let Some(e) = recovered {
                            tracing::warn!("Reloaded store with defaults before merge: {e}");
                        }
                        match store.merge(remote) {
                            Ok(added) => SyncOutcome::Merged { fetched, added },
                            Err(e) => {
                                tracing::warn!("Failed to merge fetched quotes: {e}");
                                SyncOutcome::Failed {
                                    error: e.to_string(),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Not merging, saved quotes could not be read: {e}");
                        SyncOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch quotes from server: {e}");
                SyncOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let report = SyncReport::now(outcome);

        let storage = store.persistent_mut();
        let mut state = SyncState::load(storage);
        state.record(&report);
        if let Err(e) = state.save(storage) {
            tracing::warn!("Failed to save sync state: {e}");
        }
        drop(store);
        drop(guard);

        if let SyncOutcome::Merged { fetched, added } = &report.outcome {
            tracing::info!("Quotes synced with server: {fetched} fetched, {added} new");
        }
        self.emit(report)
    }

    fn emit(&self, report: SyncReport) -> SyncReport {
        // No subscribers is fine.
        let _ = self.events.send(report.clone());
        report
    }
}
