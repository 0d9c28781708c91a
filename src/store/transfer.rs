//! JSON import and export of the quote list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{QuoteStore, StoreError};
use crate::storage::Quote;

/// MIME type of exported documents.
pub const EXPORT_MIME_TYPE: &str = "application/json";

/// A serialized copy of the store, ready to be written somewhere.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// How imported quotes are combined with the existing list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportMode {
    /// Skip quotes whose dedup key is already present (default).
    #[default]
    Dedup,
    /// Append every imported quote.
    Append,
    /// Replace the whole list with the imported quotes.
    Replace,
}

/// Result of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Quotes appended to the store.
    pub added: usize,
    /// Valid quotes skipped as duplicates.
    pub duplicates: usize,
    /// Records dropped because they were not quote-shaped.
    pub invalid: usize,
}

/// Builds the export file name: `quotes.json`, or
/// `quotes_YYYY-MM-DD-HH-MM-SS.json` when `timestamped`.
pub fn export_file_name(timestamped: bool, now: DateTime<Utc>) -> String {
    if timestamped {
        format!("quotes_{}.json", now.format("%Y-%m-%d-%H-%M-%S"))
    } else {
        "quotes.json".to_string()
    }
}

impl QuoteStore {
    /// Serializes the whole store as pretty-printed JSON.
    pub fn export_all(&self, timestamped: bool) -> Result<ExportArtifact, StoreError> {
        let contents = serde_json::to_string_pretty(self.quotes())?;
        Ok(ExportArtifact {
            file_name: export_file_name(timestamped, Utc::now()),
            mime_type: EXPORT_MIME_TYPE,
            contents,
        })
    }

    /// Parses `raw` as a JSON array of quotes and adds them to the store.
    ///
    /// Any error leaves the store untouched.
    pub fn import_all(&mut self, raw: &[u8], mode: ImportMode) -> Result<ImportSummary, StoreError> {
        let parsed: serde_json::Value = serde_json::from_slice(raw)?;
        let items = parsed.as_array().ok_or(StoreError::NotAnArray)?;

        let valid: Vec<Quote> = items.iter().filter_map(Quote::from_value).collect();
        if valid.is_empty() {
            return Err(StoreError::NoValidQuotes);
        }

        let mut summary = ImportSummary {
            invalid: items.len() - valid.len(),
            ..Default::default()
        };

        let staged = match mode {
            ImportMode::Replace => {
                summary.added = valid.len();
                valid
            }
            ImportMode::Append => {
                summary.added = valid.len();
                let mut staged = self.quotes().to_vec();
                staged.extend(valid);
                staged
            }
            ImportMode::Dedup => {
                let key = self.dedup_key();
                let mut seen = key.key_set(self.quotes());
                let mut staged = self.quotes().to_vec();
                for quote in valid {
                    if seen.insert(key.key_for(&quote)) {
                        staged.push(quote);
                        summary.added += 1;
                    } else {
                        summary.duplicates += 1;
                    }
                }
                staged
            }
        };

        self.commit(staged)?;
        tracing::info!(
            "Imported {} quote(s), {} duplicate(s), {} invalid",
            summary.added,
            summary.duplicates,
            summary.invalid
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::memory_store;

    #[test]
    fn test_export_file_name() {
        let now = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(export_file_name(false, now), "quotes.json");
        assert_eq!(export_file_name(true, now), "quotes_2024-03-05-07-08-09.json");
    }

    #[test]
    fn test_export_is_pretty_json_array() {
        let store = memory_store();
        let artifact = store.export_all(false).unwrap();

        assert_eq!(artifact.mime_type, "application/json");
        assert!(artifact.contents.starts_with("[\n  {"));
        let parsed: Vec<Quote> = serde_json::from_str(&artifact.contents).unwrap();
        assert_eq!(parsed, store.quotes());
    }

    #[test]
    fn test_export_then_replace_import_round_trips() {
        let mut source = memory_store();
        source.add("Round", "Trip", "Test").unwrap();
        let artifact = source.export_all(true).unwrap();

        let mut target = memory_store();
        target.add("Only here", "x", "Other").unwrap();
        target
            .import_all(artifact.contents.as_bytes(), ImportMode::Replace)
            .unwrap();

        assert_eq!(target.quotes(), source.quotes());
    }

    #[test]
    fn test_append_import_keeps_duplicates() {
        let mut store = memory_store();
        let original = store.quotes().to_vec();
        let artifact = store.export_all(false).unwrap();

        let summary = store
            .import_all(artifact.contents.as_bytes(), ImportMode::Append)
            .unwrap();

        assert_eq!(summary.added, original.len());
        assert_eq!(store.len(), original.len() * 2);
        assert_eq!(&store.quotes()[original.len()..], original.as_slice());
    }

    #[test]
    fn test_dedup_import_skips_existing() {
        let mut store = memory_store();
        let raw = br#"[
            {"text": "The only way to do great work is to love what you do.", "category": "Inspiration"},
            {"text": "Brand new", "author": "Me", "category": "Fresh"},
            {"text": "missing category"}
        ]"#;

        let summary = store.import_all(raw, ImportMode::Dedup).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                added: 1,
                duplicates: 1,
                invalid: 1
            }
        );
        assert_eq!(store.quotes().last().unwrap().text, "Brand new");
    }

    #[test]
    fn test_malformed_import_leaves_store_unchanged() {
        let mut store = memory_store();
        let before = store.quotes().to_vec();

        let err = store.import_all(b"[{\"text\": ", ImportMode::Dedup).unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));

        let err = store.import_all(br#"{"text":"a"}"#, ImportMode::Dedup).unwrap_err();
        assert!(matches!(err, StoreError::NotAnArray));

        let err = store.import_all(br#"[1, "two"]"#, ImportMode::Append).unwrap_err();
        assert!(matches!(err, StoreError::NoValidQuotes));

        assert_eq!(store.quotes(), before.as_slice());
    }

    #[test]
    fn test_failed_import_write_leaves_store_unchanged() {
        use crate::storage::{DedupKey, MemoryStorage, StorageError};

        let mine = vec![Quote::new("Mine", "Me", "Mine")];
        let payload = br#"[{"text":"New","author":"You","category":"Yours"}]"#;

        for mode in [ImportMode::Dedup, ImportMode::Append, ImportMode::Replace] {
            let mut store = QuoteStore::with_quotes(
                mine.clone(),
                Box::new(MemoryStorage::with_quota(0)),
                Box::new(MemoryStorage::new()),
                DedupKey::Text,
            );

            let err = store.import_all(payload, mode).unwrap_err();

            assert!(
                matches!(err, StoreError::Persist(StorageError::QuotaExceeded { .. })),
                "{mode:?} returned {err:?}"
            );
            assert_eq!(store.quotes(), mine.as_slice(), "{mode:?} changed the store");
        }
    }
}
