//! CLI commands for quotesync.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Add a quote.
pub mod add;

/// List categories.
pub mod categories;

/// Shell completion scripts.
pub mod completions;

/// Configuration viewing and management.
pub mod config;

/// Background sync daemon management.
pub mod daemon;

/// Export quotes to JSON.
pub mod export;

/// Select the category filter.
pub mod filter;

/// Import quotes from JSON.
pub mod import;

/// List quotes.
pub mod list;

/// Restore the built-in quotes.
pub mod reset;

/// Show a random or the last viewed quote.
pub mod show;

/// Store, sync and daemon overview.
pub mod status;

/// Sync with the remote feed now.
pub mod sync;
