use std::time::SystemTime;

use parking_lot::RwLock;

use super::{entry_key, DomainStore};
use crate::error::Result;

/// In-memory store, for tests and for hosts that persist entries elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<String>,
    revision: Option<SystemTime>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for entry in entries {
                let entry: String = entry.into();
                let key = entry_key(&entry);
                if !key.is_empty() && !inner.entries.iter().any(|e| entry_key(e) == key) {
                    inner.entries.push(entry.trim().to_string());
                }
            }
            inner.revision = Some(SystemTime::now());
        }
        store
    }
}

impl DomainStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.inner.read().entries.clone())
    }

    fn add(&self, entry: &str) -> Result<bool> {
        let key = entry_key(entry);
        if key.is_empty() {
            return Ok(false);
        }
        let mut inner = self.inner.write();
        if inner.entries.iter().any(|e| entry_key(e) == key) {
            return Ok(false);
        }
        inner.entries.push(entry.trim().to_string());
        inner.revision = Some(SystemTime::now());
        Ok(true)
    }

    fn remove(&self, entry: &str) -> Result<bool> {
        let key = entry_key(entry);
        let mut inner = self.inner.write();
        let Some(idx) = inner.entries.iter().position(|e| entry_key(e) == key) else {
            return Ok(false);
        };
        inner.entries.remove(idx);
        inner.revision = Some(SystemTime::now());
        Ok(true)
    }

    fn revision(&self) -> Option<SystemTime> {
        self.inner.read().revision
    }
}
