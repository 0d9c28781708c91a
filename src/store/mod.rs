//! The quote store.
//!
//! [`QuoteStore`] owns the authoritative list of quotes together with the
//! storages it is mirrored to. Every mutation is transactional: a staging
//! copy is persisted first and only becomes the live list once the write
//! succeeds, so the in-memory and persisted lists never diverge.
//!
//! # Submodules
//!
//! - `transfer` - JSON import and export

pub mod transfer;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::storage::{
    default_quotes, DedupKey, Quote, Storage, StorageError, ALL_CATEGORIES,
};

pub use transfer::{export_file_name, ExportArtifact, ImportMode, ImportSummary};

/// Persistent key holding the JSON array of quotes.
pub const QUOTES_KEY: &str = "quotesync.quotes";

/// Persistent key holding the selected category.
pub const SELECTED_CATEGORY_KEY: &str = "quotesync.selectedCategory";

/// Volatile key holding the last displayed quote.
pub const LAST_QUOTE_KEY: &str = "quotesync.lastQuote";

/// Errors reported by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field was blank after trimming.
    #[error("Please enter a quote, an author and a category ({0} is empty)")]
    MissingField(&'static str),

    /// The category is neither "all" nor present in the store.
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    /// Writing to persistent storage failed; the store kept its prior state.
    #[error("Could not save quotes: {0}")]
    Persist(#[from] StorageError),

    /// Reading persisted data failed.
    #[error("Could not read saved data: {0}")]
    Read(#[source] StorageError),

    /// Persisted quotes were not readable.
    #[error("Could not load saved quotes ({0}). Using built-in defaults.")]
    CorruptSavedData(String),

    /// Input was not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Imported JSON was valid but not an array.
    #[error("Imported JSON must be an array of quote objects")]
    NotAnArray,

    /// Imported array contained no quote-shaped records.
    #[error("No valid quotes found in the imported data")]
    NoValidQuotes,
}

/// What a display routine should render after picking a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// A quote was picked.
    Quote(Quote),
    /// The category has no quotes.
    Empty { category: String },
}

/// A freshly loaded store plus any error it recovered from.
pub struct LoadedStore {
    pub store: QuoteStore,
    /// Set when persisted data could not be read or parsed and defaults
    /// were used.
    pub recovered: Option<StoreError>,
}

/// The authoritative in-memory quote list and its storages.
pub struct QuoteStore {
    quotes: Vec<Quote>,
    selected_category: String,
    dedup_key: DedupKey,
    persistent: Box<dyn Storage>,
    volatile: Box<dyn Storage>,
}

impl QuoteStore {
    /// Loads the store from `persistent`, falling back to the defaults.
    ///
    /// Never fails: unreadable data is replaced by the built-in quotes and
    /// the error is handed back in [`LoadedStore::recovered`].
    pub fn load(
        persistent: Box<dyn Storage>,
        volatile: Box<dyn Storage>,
        dedup_key: DedupKey,
    ) -> LoadedStore {
        let mut store = Self {
            quotes: default_quotes(),
            selected_category: ALL_CATEGORIES.to_string(),
            dedup_key,
            persistent,
            volatile,
        };
        let recovered = match store.reload() {
            Ok(recovered) => recovered,
            Err(e) => Some(e),
        };
        LoadedStore { store, recovered }
    }

    /// Builds a store holding exactly `quotes`, without reading storage.
    ///
    /// Nothing is written until the first mutation.
    pub fn with_quotes(
        quotes: Vec<Quote>,
        persistent: Box<dyn Storage>,
        volatile: Box<dyn Storage>,
        dedup_key: DedupKey,
    ) -> Self {
        Self {
            quotes,
            selected_category: ALL_CATEGORIES.to_string(),
            dedup_key,
            persistent,
            volatile,
        }
    }

    /// Re-reads the persisted list and selected category.
    ///
    /// Picks up writes made by other processes since this store was loaded.
    /// With nothing valid saved the live list is kept. Unparseable saved
    /// data is replaced by the defaults and handed back as `Ok(Some(_))`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the storage cannot be read; the store
    /// is left untouched.
    pub fn reload(&mut self) -> Result<Option<StoreError>, StoreError> {
        let recovered = match read_quotes(self.persistent.as_ref()) {
            Ok(Some(quotes)) => {
                self.quotes = quotes;
                None
            }
            Ok(None) => None,
            Err(e @ StoreError::Read(_)) => {
                tracing::error!("Failed to read saved quotes: {e}");
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Failed to load saved quotes: {e}");
                self.quotes = default_quotes();
                Some(e)
            }
        };

        self.selected_category = self.read_selected_category();
        Ok(recovered)
    }

    fn read_selected_category(&self) -> String {
        match self.persistent.get(SELECTED_CATEGORY_KEY) {
            Ok(Some(category)) if self.is_known_category(&category) => category,
            Ok(Some(category)) => {
                tracing::debug!("Saved category '{category}' no longer exists, showing all");
                ALL_CATEGORIES.to_string()
            }
            Ok(None) => ALL_CATEGORIES.to_string(),
            Err(e) => {
                tracing::warn!("Failed to read selected category: {e}");
                ALL_CATEGORIES.to_string()
            }
        }
    }

    /// Persists the current list.
    pub fn save(&mut self) -> Result<(), StoreError> {
        write_quotes(self.persistent.as_mut(), &self.quotes)
    }

    /// Persists `staged` and, only if that succeeds, makes it the live list.
    fn commit(&mut self, staged: Vec<Quote>) -> Result<(), StoreError> {
        write_quotes(self.persistent.as_mut(), &staged)?;
        self.quotes = staged;
        Ok(())
    }

    /// Appends a new quote.
    ///
    /// All fields are trimmed; a blank field rejects the quote without
    /// touching the store.
    pub fn add(&mut self, text: &str, author: &str, category: &str) -> Result<Quote, StoreError> {
        let text = text.trim();
        let author = author.trim();
        let category = category.trim();

        for (field, value) in [("quote text", text), ("author", author), ("category", category)] {
            if value.is_empty() {
                return Err(StoreError::MissingField(field));
            }
        }

        let quote = Quote::new(text, author, category);
        let mut staged = self.quotes.clone();
        staged.push(quote.clone());
        self.commit(staged)?;

        tracing::debug!("Added quote in category '{category}'");
        Ok(quote)
    }

    /// Appends the remote quotes whose dedup key is not already present.
    ///
    /// Order follows `remote`. Duplicates inside `remote` itself are
    /// collapsed too. Returns the number of quotes added.
    pub fn merge(&mut self, remote: Vec<Quote>) -> Result<usize, StoreError> {
        let mut seen = self.dedup_key.key_set(&self.quotes);
        let mut staged = self.quotes.clone();

        for quote in remote {
            if seen.insert(self.dedup_key.key_for(&quote)) {
                staged.push(quote);
            }
        }

        let added = staged.len() - self.quotes.len();
        if added == 0 {
            return Ok(0);
        }

        self.commit(staged)?;
        tracing::info!("Merged {added} new quote(s)");
        Ok(added)
    }

    /// Replaces the list with the built-in defaults.
    ///
    /// A saved filter that no longer matches any quote is cleared.
    pub fn reset_to_defaults(&mut self) -> Result<(), StoreError> {
        self.commit(default_quotes())?;

        if !self.is_known_category(&self.selected_category) {
            self.persistent.remove(SELECTED_CATEGORY_KEY)?;
            self.selected_category = ALL_CATEGORIES.to_string();
        }
        Ok(())
    }

    /// All quotes for `category`, or every quote for "all".
    pub fn filtered_view(&self, category: &str) -> Vec<&Quote> {
        if category == ALL_CATEGORIES {
            return self.quotes.iter().collect();
        }
        self.quotes
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.quotes
            .iter()
            .filter(|q| seen.insert(q.category.as_str()))
            .map(|q| q.category.clone())
            .collect()
    }

    fn is_known_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.quotes.iter().any(|q| q.category == category)
    }

    /// Persists a new filter selection.
    pub fn select_category(&mut self, category: &str) -> Result<(), StoreError> {
        let category = category.trim();
        if !self.is_known_category(category) {
            return Err(StoreError::UnknownCategory(category.to_string()));
        }

        self.persistent.set(SELECTED_CATEGORY_KEY, category)?;
        self.selected_category = category.to_string();
        Ok(())
    }

    /// Picks a random quote from the selected category.
    pub fn show_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DisplayState {
        let category = self.selected_category.clone();
        self.show_random_in(&category, rng)
    }

    /// Picks a random quote from `category` and records it as last viewed.
    ///
    /// Does not change the selected category.
    pub fn show_random_in<R: Rng + ?Sized>(&mut self, category: &str, rng: &mut R) -> DisplayState {
        let picked = {
            let view = self.filtered_view(category);
            pick_random(&view, rng).cloned()
        };

        match picked {
            Some(quote) => {
                self.remember_last_viewed(&quote);
                DisplayState::Quote(quote)
            }
            None => DisplayState::Empty {
                category: category.to_string(),
            },
        }
    }

    fn remember_last_viewed(&mut self, quote: &Quote) {
        let result = serde_json::to_string(quote)
            .map_err(StoreError::from)
            .and_then(|json| Ok(self.volatile.set(LAST_QUOTE_KEY, &json)?));
        if let Err(e) = result {
            tracing::warn!("Could not save last viewed quote: {e}");
        }
    }

    /// The quote most recently shown in this login session.
    pub fn last_viewed(&self) -> Option<Quote> {
        let raw = match self.volatile.get(LAST_QUOTE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Could not read last viewed quote: {e}");
                return None;
            }
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => Quote::from_value(&value),
            Err(e) => {
                tracing::warn!("Could not restore last viewed quote: {e}");
                None
            }
        }
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.dedup_key
    }

    /// Gives the store's persistent storage to callers that keep their own
    /// keys next to the quotes (sync state).
    pub fn persistent_mut(&mut self) -> &mut dyn Storage {
        self.persistent.as_mut()
    }
}

/// Uniform random choice over `view`; `None` when it is empty.
pub fn pick_random<'a, R: Rng + ?Sized>(view: &[&'a Quote], rng: &mut R) -> Option<&'a Quote> {
    view.choose(rng).copied()
}

fn write_quotes(storage: &mut dyn Storage, quotes: &[Quote]) -> Result<(), StoreError> {
    let json = serde_json::to_string(quotes)?;
    storage.set(QUOTES_KEY, &json).map_err(|e| {
        tracing::error!("Failed to save quotes: {e}");
        StoreError::Persist(e)
    })
}

/// Reads the persisted quote list.
///
/// `Ok(None)` means "use the defaults": nothing saved, or nothing valid.
fn read_quotes(storage: &dyn Storage) -> Result<Option<Vec<Quote>>, StoreError> {
    let raw = match storage.get(QUOTES_KEY).map_err(StoreError::Read)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let parsed: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| StoreError::CorruptSavedData(e.to_string()))?;
    let items = parsed
        .as_array()
        .ok_or_else(|| StoreError::CorruptSavedData("expected a JSON array".to_string()))?;

    let valid: Vec<Quote> = items.iter().filter_map(Quote::from_value).collect();
    if valid.len() < items.len() {
        tracing::warn!(
            "Dropped {} saved record(s) that are not quotes",
            items.len() - valid.len()
        );
    }

    if valid.is_empty() {
        Ok(None)
    } else {
        Ok(Some(valid))
    }
}
