//! Host matchers built from blacklist and whitelist entries.

mod blacklist;
mod whitelist;

pub use blacklist::BlacklistMatcher;
pub use whitelist::WhitelistMatcher;

/// Trait for host matchers
pub trait HostMatcher: Send + Sync {
    /// Check if the host matches this matcher.
    /// Assumes `host` is already normalized (lowercased, no leading `www.`).
    fn matches(&self, host: &str) -> bool;
}

/// Walk a host from most specific to least specific.
///
/// `a.b.example.com` yields `a.b.example.com`, `b.example.com`,
/// `example.com`, `com`.
pub(crate) fn host_suffixes(host: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(host);
    std::iter::from_fn(move || {
        let current = next?;
        next = current.find('.').map(|pos| &current[pos + 1..]);
        Some(current)
    })
}
