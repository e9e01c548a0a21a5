//! Store-backed domain lists with a cached matcher.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::link::host_of;
use crate::matcher::{BlacklistMatcher, HostMatcher, WhitelistMatcher};
use crate::parser::{parse_host, parse_rule};
use crate::store::DomainStore;
use crate::types::{BlacklistHit, BlacklistRule};

/// An entry type that can be parsed from a store line and compiled into a matcher
pub trait ListEntry: Sized + PartialEq {
    type Matcher: Send + Sync;

    /// Short name used in log events
    const KIND: &'static str;

    /// Parse and normalize a store line or admin input
    fn parse(line: &str) -> Result<Self>;

    /// Single-line form written to the store
    fn canonical(&self) -> String;

    /// Compile parsed entries into a matcher
    fn compile(entries: &[Self]) -> Self::Matcher;
}

impl ListEntry for BlacklistRule {
    type Matcher = BlacklistMatcher;
    const KIND: &'static str = "blacklist";

    fn parse(line: &str) -> Result<Self> {
        parse_rule(line)
    }

    fn canonical(&self) -> String {
        BlacklistRule::canonical(self)
    }

    fn compile(entries: &[Self]) -> BlacklistMatcher {
        BlacklistMatcher::new(entries)
    }
}

/// A normalized whitelist host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhitelistEntry(pub String);

impl ListEntry for WhitelistEntry {
    type Matcher = WhitelistMatcher;
    const KIND: &'static str = "whitelist";

    fn parse(line: &str) -> Result<Self> {
        parse_host(line).map(WhitelistEntry)
    }

    fn canonical(&self) -> String {
        self.0.clone()
    }

    fn compile(entries: &[Self]) -> WhitelistMatcher {
        let hosts: Vec<String> = entries.iter().map(|e| e.0.clone()).collect();
        WhitelistMatcher::new(&hosts)
    }
}

/// A domain list: authoritative store plus a cached, derived matcher
pub struct DomainList<E: ListEntry> {
    store: Arc<dyn DomainStore>,
    cache: TtlCache<E::Matcher>,
    _entry: PhantomData<fn() -> E>,
}

/// Hard-block list of domains and path prefixes
pub type Blacklist = DomainList<BlacklistRule>;

/// Trusted domains, consulted when LinkGuard is active
pub type Whitelist = DomainList<WhitelistEntry>;

impl<E: ListEntry> DomainList<E> {
    /// Create a list over `store` whose matcher may lag by at most `ttl`
    pub fn new(store: Arc<dyn DomainStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: TtlCache::new(ttl),
            _entry: PhantomData,
        }
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn DomainStore> {
        &self.store
    }

    /// Current matcher, rebuilt from the store if stale
    pub fn matcher(&self) -> Result<Arc<E::Matcher>> {
        self.cache.get_or_rebuild(self.store.revision(), || {
            let entries = self.entries()?;
            tracing::debug!(list = E::KIND, entries = entries.len(), "rebuilt matcher");
            Ok(E::compile(&entries))
        })
    }

    /// All valid entries in store order. Lines that do not parse are skipped.
    pub fn entries(&self) -> Result<Vec<E>> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter_map(|line| match E::parse(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(list = E::KIND, error = %e, "skipping entry");
                    None
                }
            })
            .collect())
    }

    /// Check if the normalized form of `input` is already listed
    pub fn contains(&self, input: &str) -> Result<bool> {
        let entry = E::parse(input)?;
        Ok(self.entries()?.contains(&entry))
    }

    /// Add an entry. Returns `false` if its normalized form is already listed.
    ///
    /// Input that cannot be normalized is rejected with `InvalidRule`.
    pub fn add(&self, input: &str) -> Result<bool> {
        let entry = E::parse(input)?;
        if self.entries()?.contains(&entry) {
            return Ok(false);
        }

        let canonical = entry.canonical();
        let added = self.store.add(&canonical)?;
        self.cache.invalidate();
        if added {
            tracing::info!(list = E::KIND, entry = %canonical, "entry added");
        }
        Ok(added)
    }

    /// Remove the first stored line equivalent to `input`. Returns `false` if none.
    pub fn remove(&self, input: &str) -> Result<bool> {
        let entry = E::parse(input)?;
        let stored = self
            .store
            .list()?
            .into_iter()
            .find(|line| E::parse(line).is_ok_and(|e| e == entry));

        let Some(line) = stored else {
            return Ok(false);
        };

        let removed = self.store.remove(&line)?;
        self.cache.invalidate();
        if removed {
            tracing::info!(list = E::KIND, entry = %entry.canonical(), "entry removed");
        }
        Ok(removed)
    }

    /// Drop the cached matcher; the next lookup reloads the store
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

impl Blacklist {
    /// Match a normalized URL against the blacklist
    pub fn match_url(&self, url: &str) -> Result<Option<BlacklistHit>> {
        Ok(self.matcher()?.match_url(url))
    }

    /// Number of distinct rules
    pub fn len(&self) -> Result<usize> {
        Ok(self.matcher()?.len())
    }
}

impl Whitelist {
    /// Check if `host` or one of its parent domains is whitelisted.
    ///
    /// Accepts a bare host or a full URL.
    pub fn is_whitelisted(&self, host: &str) -> Result<bool> {
        let Some(host) = normalize_host(host) else {
            return Ok(false);
        };
        Ok(self.matcher()?.matches(&host))
    }

    /// Number of whitelisted hosts
    pub fn len(&self) -> Result<usize> {
        Ok(self.matcher()?.len())
    }
}

fn normalize_host(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("://") {
        return host_of(input);
    }
    let host = input.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    Some(host.to_string())
}
