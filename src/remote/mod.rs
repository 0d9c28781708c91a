//! Remote quote feed.
//!
//! Talks to a public REST endpoint that serves posts shaped like
//! `{title, userId, ...}`. Fetched posts become quotes in the "Fetched"
//! category; newly added local quotes are posted back best-effort.
//!
//! # Submodules
//!
//! - `client` - HTTP client for the feed

pub mod client;

use std::future::Future;

use crate::storage::Quote;

pub use client::{PostReceipt, RemoteClient, RemotePost};

/// Default feed endpoint, used for both reads and writes.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Errors from the remote feed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// HTTP request error.
    #[error("{}", friendly_network_error(.0))]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

/// Anything that can produce a batch of remote quotes.
///
/// [`RemoteClient`] is the real implementation; the sync manager is generic
/// over this so it can run against canned data.
pub trait QuoteSource: Send + Sync {
    fn fetch_quotes(&self) -> impl Future<Output = Result<Vec<Quote>, RemoteError>> + Send;
}

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_builder() {
        if let Some(url) = e.url() {
            return format!("Invalid URL: {url}");
        }
        return "Invalid URL".to_string();
    }
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Request timed out".to_string();
    }
    if e.is_decode() {
        return "Invalid response from server".to_string();
    }
    format!("Network error: {e}")
}
