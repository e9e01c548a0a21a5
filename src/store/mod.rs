//! Backing stores for blacklist and whitelist entries.
//!
//! The matching engine only depends on the [`DomainStore`] trait, so the flat
//! file can be swapped for any other persistence layer that can list, add,
//! remove and look up entries.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::time::SystemTime;

use crate::error::Result;

/// Default contents of a freshly created blacklist file
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "# Blacklisted domains - one per line",
    "discord-nitro.ru",
    "free-nitro.com",
    "steamcommunnitty.ru",
    "discordgift.co",
];

/// Default contents of a freshly created whitelist file
pub const DEFAULT_WHITELIST: &[&str] = &[
    "# Whitelisted domains - one per line",
    "# Google Docs/Drive",
    "docs.google.com",
    "drive.google.com",
    "forms.gle",
    "sites.google.com",
    "googleusercontent.com",
    "# Medal.tv",
    "medal.tv",
    "medal.gg",
];

/// Persistence layer for domain entries.
///
/// Entries are single-line strings. Comparison is case-insensitive and
/// ignores surrounding whitespace.
pub trait DomainStore: Send + Sync {
    /// All entries, in stored order, without comments or blank lines
    fn list(&self) -> Result<Vec<String>>;

    /// Append an entry. Returns `false` if it is already present.
    fn add(&self, entry: &str) -> Result<bool>;

    /// Remove the first occurrence of an entry. Returns `false` if absent.
    fn remove(&self, entry: &str) -> Result<bool>;

    /// Check if an entry is present
    fn exists(&self, entry: &str) -> Result<bool> {
        let needle = entry_key(entry);
        Ok(self.list()?.iter().any(|e| entry_key(e) == needle))
    }

    /// Stamp that changes whenever the store is modified, if the store can tell.
    fn revision(&self) -> Option<SystemTime> {
        None
    }
}

/// Comparison key for an entry
pub(crate) fn entry_key(entry: &str) -> String {
    entry.trim().to_lowercase()
}
