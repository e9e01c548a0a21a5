use std::collections::HashSet;

use super::{host_suffixes, HostMatcher};

/// Whitelist matcher.
///
/// A whitelisted host also trusts all of its subdomains. The converse does
/// not hold: whitelisting `docs.google.com` does not whitelist `google.com`.
#[derive(Debug, Clone, Default)]
pub struct WhitelistMatcher {
    hosts: HashSet<String>,
}

impl WhitelistMatcher {
    /// Create a new whitelist matcher from normalized hosts
    pub fn new(hosts: &[String]) -> Self {
        Self {
            hosts: hosts.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    /// Number of whitelisted hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if the whitelist is empty
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl HostMatcher for WhitelistMatcher {
    fn matches(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        host_suffixes(host).any(|suffix| self.hosts.contains(suffix))
    }
}
