//! quotesync - a personal quote collection with a remote feed
//!
//! Quotes are kept in a local store, shown at random, filtered by category,
//! imported and exported as JSON, and merged with quotes fetched from a
//! public REST endpoint.

pub mod config;
pub mod daemon;
pub mod remote;
pub mod storage;
pub mod store;
pub mod sync;
