//! Core data models for quotesync
//!
//! A quote is the only record type. It has no identifier; identity for
//! dedup purposes is derived from its content (see [`DedupKey`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Category sentinel meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

/// Category assigned to every quote fetched from the remote feed.
pub const FETCHED_CATEGORY: &str = "Fetched";

/// A single quote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    /// The quote itself
    pub text: String,

    /// Who said it (absent on records written by early versions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Free-form category used for filtering
    pub category: String,
}

impl Quote {
    /// Creates a quote with an author.
    pub fn new(text: &str, author: &str, category: &str) -> Self {
        Self {
            text: text.to_string(),
            author: Some(author.to_string()),
            category: category.to_string(),
        }
    }

    /// Returns the author, or "Unknown" when the record has none.
    pub fn author_or_unknown(&self) -> &str {
        match self.author.as_deref() {
            Some(a) if !a.trim().is_empty() => a,
            _ => "Unknown",
        }
    }

    /// Attempts to read a quote out of an arbitrary JSON value.
    ///
    /// Only objects with non-blank string `text` and `category` fields
    /// qualify. A non-string `author` is treated as missing rather than
    /// rejecting the whole record.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = obj.get("text")?.as_str()?;
        let category = obj.get("category")?.as_str()?;
        if text.trim().is_empty() || category.trim().is_empty() {
            return None;
        }
        let author = obj
            .get("author")
            .and_then(|a| a.as_str())
            .map(str::to_string);

        Some(Self {
            text: text.to_string(),
            author,
            category: category.to_string(),
        })
    }
}

/// Which fields make two quotes "the same" during merge and import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// Quotes with identical text are duplicates regardless of category.
    #[default]
    Text,
    /// Quotes are duplicates only when text and category both match.
    TextAndCategory,
}

impl DedupKey {
    /// Derives the membership key for a quote.
    pub fn key_for(&self, quote: &Quote) -> String {
        match self {
            DedupKey::Text => quote.text.clone(),
            DedupKey::TextAndCategory => format!("{}\u{1f}{}", quote.text, quote.category),
        }
    }

    /// Builds the set of keys already present in `quotes`.
    pub fn key_set<'a>(&self, quotes: impl IntoIterator<Item = &'a Quote>) -> HashSet<String> {
        quotes.into_iter().map(|q| self.key_for(q)).collect()
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupKey::Text => write!(f, "text"),
            DedupKey::TextAndCategory => write!(f, "text_and_category"),
        }
    }
}

impl std::str::FromStr for DedupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(DedupKey::Text),
            "text_and_category" | "text-and-category" => Ok(DedupKey::TextAndCategory),
            other => Err(format!(
                "unknown dedup key '{other}' (expected 'text' or 'text_and_category')"
            )),
        }
    }
}

/// The built-in quotes used when nothing valid has been persisted.
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The only way to do great work is to love what you do.",
            "Steve Jobs",
            "Inspiration",
        ),
        Quote::new(
            "Life is what happens when you're busy making other plans.",
            "John Lennon",
            "Life",
        ),
        Quote::new(
            "Success is not final; failure is not fatal: it is the courage to continue that counts.",
            "Winston Churchill",
            "Motivation",
        ),
    ]
}
