//! Configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is
//! a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_TTL;
use crate::error::{LinkGuardError, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the blacklist, whitelist, settings and seed files
    pub data_dir: PathBuf,
    pub blacklist_file: String,
    pub whitelist_file: String,
    pub settings_file: String,
    /// Maximum age of the cached matchers, in seconds
    pub cache_ttl_secs: u64,
    pub linkguard: LinkGuardConfig,
    pub word_blocker: WordBlockerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            blacklist_file: "blacklist_domains.txt".to_string(),
            whitelist_file: "whitelist_domains.txt".to_string(),
            settings_file: "linkguard_settings.json".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            linkguard: LinkGuardConfig::default(),
            word_blocker: WordBlockerConfig::default(),
        }
    }
}

/// LinkGuard feature defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkGuardConfig {
    /// State of a guild that has no stored settings
    pub enabled_by_default: bool,
}

/// Word similarity checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordBlockerConfig {
    pub enabled: bool,
    /// Minimum cosine similarity for a hit
    pub score_threshold: f64,
    /// Shorter messages are not checked
    pub min_text_length: usize,
    pub top_k: usize,
    pub vector_dimensions: usize,
    pub ngram_size: usize,
    /// Seed phrase file, relative to `data_dir` unless absolute
    pub seeds_file: PathBuf,
}

impl Default for WordBlockerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            score_threshold: 0.6,
            min_text_length: 4,
            top_k: 1,
            vector_dimensions: 384,
            ngram_size: 3,
            seeds_file: PathBuf::from("word_similarity.txt"),
        }
    }
}

impl Config {
    /// Parse a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| LinkGuardError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            LinkGuardError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        let wb = &self.word_blocker;
        if wb.vector_dimensions == 0 {
            return Err(LinkGuardError::ConfigError(
                "word_blocker.vector_dimensions must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&wb.score_threshold) {
            return Err(LinkGuardError::ConfigError(format!(
                "word_blocker.score_threshold must be within [0, 1], got {}",
                wb.score_threshold
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn blacklist_path(&self) -> PathBuf {
        self.data_dir.join(&self.blacklist_file)
    }

    pub fn whitelist_path(&self) -> PathBuf {
        self.data_dir.join(&self.whitelist_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn seeds_path(&self) -> PathBuf {
        self.data_dir.join(&self.word_blocker.seeds_file)
    }
}
