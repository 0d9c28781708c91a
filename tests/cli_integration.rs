//! Integration tests for quotesync
//!
//! These tests drive the store and sync layers through the public library API
//! using temporary databases, and run the `quotes` binary against an isolated
//! home directory.

use assert_cmd::Command;
use predicates::prelude::*;
use quotesync::remote::{QuoteSource, RemoteError, RemotePost};
use quotesync::storage::{
    default_quotes, DedupKey, MemoryStorage, Quote, SqliteStorage, Storage, ALL_CATEGORIES,
};
use quotesync::store::{ImportMode, QuoteStore, StoreError, QUOTES_KEY};
use quotesync::sync::{SyncManager, SyncOutcome, SyncState};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::Mutex;

// =============================================================================
// Test Helpers
// =============================================================================

/// Opens a store backed by SQLite files in `dir`.
fn open_store(dir: &Path) -> QuoteStore {
    let persistent = SqliteStorage::open(&dir.join("quotes.db")).expect("open persistent db");
    let volatile = SqliteStorage::open(&dir.join("session.db")).expect("open session db");
    let loaded = QuoteStore::load(Box::new(persistent), Box::new(volatile), DedupKey::Text);
    assert!(loaded.recovered.is_none(), "unexpected recovery");
    loaded.store
}

/// Feed stand-in that serves posts parsed from a JSON body.
struct CannedFeed {
    body: &'static str,
}

impl QuoteSource for CannedFeed {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        let posts: Vec<RemotePost> =
            serde_json::from_str(self.body).map_err(|e| RemoteError::ServerError {
                status: 500,
                message: e.to_string(),
            })?;
        Ok(posts.into_iter().map(RemotePost::into_quote).collect())
    }
}

/// Feed stand-in that is always down.
struct DownFeed;

impl QuoteSource for DownFeed {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        Err(RemoteError::ServerError {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }
}

/// Runs the binary with home and runtime dirs pointed at `dir`.
fn quotes(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quotes").expect("binary built");
    cmd.env("HOME", dir)
        .env("XDG_RUNTIME_DIR", dir.join("run"))
        .env_remove("RUST_LOG");
    cmd
}

// =============================================================================
// Store Scenarios
// =============================================================================

#[test]
fn test_fresh_database_starts_with_defaults() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    assert_eq!(store.quotes(), default_quotes().as_slice());
    assert_eq!(store.selected_category(), ALL_CATEGORIES);
}

#[test]
fn test_added_quote_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut store = open_store(dir.path());
        store
            .add("Simplicity is the soul of efficiency.", "Austin Freeman", "Craft")
            .unwrap();
        store.select_category("Craft").unwrap();
    }

    let store = open_store(dir.path());
    assert_eq!(store.len(), default_quotes().len() + 1);
    assert_eq!(store.selected_category(), "Craft");
    let view = store.filtered_view("Craft");
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].author.as_deref(), Some("Austin Freeman"));
}

#[test]
fn test_add_with_blank_field_changes_nothing() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let err = store.add("   ", "Someone", "Life").unwrap_err();
    assert!(matches!(err, StoreError::MissingField(_)));
    assert_eq!(store.len(), default_quotes().len());

    let reopened = open_store(dir.path());
    assert_eq!(reopened.len(), default_quotes().len());
}

#[test]
fn test_corrupt_saved_quotes_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("quotes.db");
    {
        let mut raw = SqliteStorage::open(&db_path).unwrap();
        raw.set(QUOTES_KEY, "{not json").unwrap();
    }

    let loaded = QuoteStore::load(
        Box::new(SqliteStorage::open(&db_path).unwrap()),
        Box::new(MemoryStorage::new()),
        DedupKey::Text,
    );

    assert!(matches!(
        loaded.recovered,
        Some(StoreError::CorruptSavedData(_))
    ));
    assert_eq!(loaded.store.quotes(), default_quotes().as_slice());
}

#[test]
fn test_export_then_replace_import_round_trips() {
    let dir = tempdir().unwrap();
    let mut source = open_store(dir.path());
    source.add("Less is more.", "Mies", "Design").unwrap();
    let artifact = source.export_all(false).unwrap();
    assert_eq!(artifact.file_name, "quotes.json");

    let other = tempdir().unwrap();
    let mut target = open_store(other.path());
    target.add("Something else entirely.", "Nobody", "Misc").unwrap();

    let summary = target
        .import_all(artifact.contents.as_bytes(), ImportMode::Replace)
        .unwrap();
    assert_eq!(summary.added, source.len());
    assert_eq!(target.quotes(), source.quotes());
}

#[test]
fn test_malformed_import_leaves_store_unchanged() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let before = store.quotes().to_vec();

    let err = store
        .import_all(b"[{\"text\": \"unterminated", ImportMode::Dedup)
        .unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
    assert_eq!(store.quotes(), before.as_slice());

    let reopened = open_store(dir.path());
    assert_eq!(reopened.quotes(), before.as_slice());
}

#[test]
fn test_import_skips_duplicates_and_invalid_records() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let existing = store.quotes()[0].text.clone();

    let payload = serde_json::json!([
        {"text": existing, "author": "Steve Jobs", "category": "Inspiration"},
        {"text": "Fresh words.", "category": "New"},
        {"text": "", "category": "New"},
        {"author": "No text"}
    ])
    .to_string();

    let summary = store
        .import_all(payload.as_bytes(), ImportMode::Dedup)
        .unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.invalid, 2);

    let added = store.filtered_view("New");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].author_or_unknown(), "Unknown");
}

// =============================================================================
// Sync Scenarios
// =============================================================================

#[tokio::test]
async fn test_sync_into_empty_store() {
    let dir = tempdir().unwrap();
    let store = QuoteStore::with_quotes(
        Vec::new(),
        Box::new(SqliteStorage::open(&dir.path().join("quotes.db")).unwrap()),
        Box::new(MemoryStorage::new()),
        DedupKey::Text,
    );
    let shared = Arc::new(Mutex::new(store));
    let manager = SyncManager::new(
        CannedFeed {
            body: r#"[{"title":"A","userId":1,"id":1},{"title":"B","userId":2,"id":2}]"#,
        },
        shared.clone(),
    );

    let report = manager.sync().await;
    assert!(matches!(
        report.outcome,
        SyncOutcome::Merged { fetched: 2, .. }
    ));

    let store = shared.lock().await;
    assert_eq!(
        store.quotes(),
        &[
            Quote::new("A", "User 1", "Fetched"),
            Quote::new("B", "User 2", "Fetched"),
        ]
    );

    // The merged list is what was saved.
    let reopened = open_store(dir.path());
    assert_eq!(reopened.quotes(), store.quotes());
}

#[tokio::test]
async fn test_sync_adds_only_unseen_quotes() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    store
        .import_all(
            br#"[{"text":"A","author":"User 1","category":"Fetched"}]"#,
            ImportMode::Replace,
        )
        .unwrap();

    let shared = Arc::new(Mutex::new(store));
    let manager = SyncManager::new(
        CannedFeed {
            body: r#"[{"title":"A","userId":1},{"title":"C","userId":3}]"#,
        },
        shared.clone(),
    );

    let report = manager.sync().await;
    assert_eq!(
        report.outcome,
        SyncOutcome::Merged {
            fetched: 2,
            added: 1
        }
    );

    let texts: Vec<String> = shared
        .lock()
        .await
        .quotes()
        .iter()
        .map(|q| q.text.clone())
        .collect();
    assert_eq!(texts, vec!["A", "C"]);

    // Running it again changes nothing.
    let again = manager.sync().await;
    assert_eq!(
        again.outcome,
        SyncOutcome::Merged {
            fetched: 2,
            added: 0
        }
    );
}

#[tokio::test]
async fn test_sync_keeps_quotes_added_by_another_process() {
    let dir = tempdir().unwrap();
    let shared = Arc::new(Mutex::new(open_store(dir.path())));
    let manager = SyncManager::new(
        CannedFeed {
            body: r#"[{"title":"Remote","userId":7}]"#,
        },
        shared.clone(),
    );

    // A second handle on the same database, as the CLI would have.
    let mut cli_store = open_store(dir.path());
    cli_store.add("Local words.", "Me", "Mine").unwrap();

    manager.sync().await;

    let reopened = open_store(dir.path());
    assert_eq!(reopened.filtered_view("Mine").len(), 1);
    assert_eq!(reopened.filtered_view("Fetched").len(), 1);
}

#[tokio::test]
async fn test_failed_sync_is_recorded_and_store_untouched() {
    let dir = tempdir().unwrap();
    let shared = Arc::new(Mutex::new(open_store(dir.path())));
    let manager = SyncManager::new(DownFeed, shared.clone());

    let report = manager.sync().await;
    match &report.outcome {
        SyncOutcome::Failed { error } => assert!(error.contains("503")),
        other => panic!("expected failure, got {other:?}"),
    }

    let mut store = shared.lock().await;
    assert_eq!(store.quotes(), default_quotes().as_slice());
    let state = SyncState::load(store.persistent_mut());
    assert_eq!(state.last_sync_success, Some(false));
    assert!(state.last_sync_at.is_some());
}

// =============================================================================
// Binary Smoke Tests
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("daemon"));
}

#[test]
fn test_completions_bash() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quotes"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .args(["config", "get", "no_such_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_key"));
}

#[test]
fn test_config_set_then_get() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .args(["config", "set", "sync_interval_secs", "60"])
        .assert()
        .success();
    quotes(dir.path())
        .args(["config", "get", "sync_interval_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("60\n"));
}

#[test]
fn test_add_offline_then_list_json() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .args([
            "add",
            "Done is better than perfect.",
            "--author",
            "Sheryl Sandberg",
            "--category",
            "Work",
            "--offline",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("New quote added successfully!"));

    let output = quotes(dir.path())
        .args(["list", "--category", "Work", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed: Vec<Quote> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        listed,
        vec![Quote::new(
            "Done is better than perfect.",
            "Sheryl Sandberg",
            "Work"
        )]
    );
}

#[test]
fn test_filter_unknown_category_fails() {
    let dir = tempdir().unwrap();
    quotes(dir.path())
        .args(["filter", "Nonexistent"])
        .assert()
        .failure();
}
