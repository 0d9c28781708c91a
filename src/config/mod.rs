//! Configuration management
//!
//! Settings live in `~/.quotesync/config.yaml`. A missing file means all
//! defaults; unknown keys in the file are ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::remote::DEFAULT_ENDPOINT;
use crate::storage::DedupKey;
use crate::sync::DEFAULT_SYNC_INTERVAL_SECS;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "endpoint",
    "sync_interval_secs",
    "dedup_key",
    "post_new_quotes",
    "timestamped_exports",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed URL used for fetching and posting quotes
    pub endpoint: String,

    /// Seconds between automatic syncs in the daemon
    pub sync_interval_secs: u64,

    /// Which fields identify a duplicate during merge and import
    pub dedup_key: DedupKey,

    /// Post newly added quotes to the feed
    pub post_new_quotes: bool,

    /// Add a timestamp to exported file names
    pub timestamped_exports: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            dedup_key: DedupKey::default(),
            post_new_quotes: true,
            timestamped_exports: false,
        }
    }
}

impl Config {
    /// Loads the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads the config from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_saphyr::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".quotesync");

        Ok(config_dir.join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            anyhow::bail!("sync_interval_secs must be greater than zero");
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            anyhow::bail!("endpoint must be an http(s) URL, got '{}'", self.endpoint);
        }
        Ok(())
    }

    /// Reads one setting as a string.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "endpoint" => self.endpoint.clone(),
            "sync_interval_secs" => self.sync_interval_secs.to_string(),
            "dedup_key" => self.dedup_key.to_string(),
            "post_new_quotes" => self.post_new_quotes.to_string(),
            "timestamped_exports" => self.timestamped_exports.to_string(),
            _ => anyhow::bail!(
                "Unknown config key '{key}'. Valid keys: {}",
                CONFIG_KEYS.join(", ")
            ),
        };
        Ok(value)
    }

    /// Updates one setting from a string. The config is left unchanged on
    /// error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "endpoint" => updated.endpoint = value.trim_end_matches('/').to_string(),
            "sync_interval_secs" => {
                updated.sync_interval_secs = value
                    .parse()
                    .with_context(|| format!("'{value}' is not a number of seconds"))?
            }
            "dedup_key" => updated.dedup_key = value.parse().map_err(anyhow::Error::msg)?,
            "post_new_quotes" => updated.post_new_quotes = parse_bool(value)?,
            "timestamped_exports" => updated.timestamped_exports = parse_bool(value)?,
            _ => anyhow::bail!(
                "Unknown config key '{key}'. Valid keys: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("'{value}' is not a boolean (use true or false)"),
    }
}
