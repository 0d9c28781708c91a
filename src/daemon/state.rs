//! Daemon runtime files and statistics.
//!
//! The daemon and the CLI coordinate through three files in
//! `~/.quotesync/`: a PID file, the IPC socket and the log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::db::data_dir;
use crate::sync::{SyncOutcome, SyncReport};

/// Locations of the daemon's runtime files.
pub struct DaemonState {
    /// `daemon.pid`
    pub pid_file: PathBuf,
    /// `daemon.sock`
    pub socket_path: PathBuf,
    /// `daemon.log`
    pub log_file: PathBuf,
}

impl DaemonState {
    /// Uses the default data directory, creating it if needed.
    pub fn new() -> Result<Self> {
        Ok(Self::in_dir(&data_dir()?))
    }

    /// Places all runtime files in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            pid_file: dir.join("daemon.pid"),
            socket_path: dir.join("daemon.sock"),
            log_file: dir.join("daemon.log"),
        }
    }

    /// True when the PID file names a live process.
    pub fn is_running(&self) -> bool {
        self.get_pid().is_some_and(process_exists)
    }

    /// PID recorded in the PID file, if it exists and parses.
    pub fn get_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.pid_file)
            .ok()
            .and_then(|contents| contents.trim().parse().ok())
    }

    pub fn write_pid(&self, pid: u32) -> Result<()> {
        fs::write(&self.pid_file, pid.to_string()).context("Failed to write PID file")
    }

    /// Removes the PID file and socket. Missing files are fine.
    pub fn cleanup(&self) -> Result<()> {
        for path in [&self.pid_file, &self.socket_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
                }
            }
        }
        Ok(())
    }
}

/// Checks for a live process with `kill(pid, 0)`.
fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: signal 0 performs only the existence and permission check.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

/// Counters the daemon keeps about its syncs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStats {
    /// When the daemon started.
    pub started_at: DateTime<Utc>,
    /// Syncs that fetched and merged successfully.
    pub syncs_completed: u64,
    /// Syncs that failed to fetch or save.
    pub syncs_failed: u64,
    /// Triggers dropped because a sync was already running.
    pub syncs_skipped: u64,
    /// Quotes added by all syncs.
    pub quotes_added: u64,
    /// When the last non-skipped sync finished.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Default for DaemonStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            syncs_completed: 0,
            syncs_failed: 0,
            syncs_skipped: 0,
            quotes_added: 0,
            last_sync_at: None,
        }
    }
}

impl DaemonStats {
    /// Folds one sync report into the counters.
    pub fn record(&mut self, report: &SyncReport) {
        match &report.outcome {
            SyncOutcome::Merged { added, .. } => {
                self.syncs_completed += 1;
                self.quotes_added += *added as u64;
                self.last_sync_at = Some(report.finished_at);
            }
            SyncOutcome::Failed { .. } => {
                self.syncs_failed += 1;
                self.last_sync_at = Some(report.finished_at);
            }
            SyncOutcome::Skipped => self.syncs_skipped += 1,
        }
    }
}
