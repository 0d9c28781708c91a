//! Storage layer for quotesync

pub mod db;
pub mod models;

pub use db::{MemoryStorage, SqliteStorage, Storage, StorageError};
pub use models::*;
