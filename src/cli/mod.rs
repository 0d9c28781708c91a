//! Command-line interface for quotesync.
//!
//! A thin presentation layer: commands open the store, call one store or
//! sync operation and render what it returns.

/// Individual CLI command implementations.
pub mod commands;

/// Output formatting helpers.
pub mod format;

use anyhow::{Context, Result};
use colored::Colorize;
use quotesync::config::Config;
use quotesync::storage::SqliteStorage;
use quotesync::store::QuoteStore;

/// Opens the persistent and session storages and loads the store.
///
/// Unreadable saved data is reported as a warning; the store falls back to
/// the built-in quotes.
pub fn open_store(config: &Config) -> Result<QuoteStore> {
    let persistent = SqliteStorage::open_default().context("Could not open quote database")?;
    let volatile = SqliteStorage::open_volatile().context("Could not open session storage")?;

    let loaded = QuoteStore::load(Box::new(persistent), Box::new(volatile), config.dedup_key);
    if let Some(e) = loaded.recovered {
        eprintln!("{} {}", "Warning:".yellow(), e);
    }
    Ok(loaded.store)
}

/// Creates a single-threaded runtime for one-off async work.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}
