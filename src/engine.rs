//! Domain match engine.
//!
//! Ties the blacklist and whitelist together with link extraction:
//! - [`DomainEngine::scan_message`]: first blacklisted link in a message
//! - [`DomainEngine::non_whitelisted_urls`]: links LinkGuard would block
//! - [`DomainEngine::classify_risk`]: coarse risk hint for a single URL

use std::sync::Arc;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::config::Config;
use crate::error::Result;
use crate::link::{extract_urls, host_of, normalize};
use crate::list::{Blacklist, Whitelist};
use crate::store::{DomainStore, FileStore, DEFAULT_BLACKLIST, DEFAULT_WHITELIST};
use crate::types::{BlacklistHit, MatchType, RiskLevel, RiskReport};

/// Substrings that make a host look like a phishing lure
pub const PHISHING_KEYWORDS: &[&str] = &[
    "nitro", "gift", "steam", "discord", "verify", "login", "free",
];

/// Engine builder options.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Maximum staleness of the cached matchers
    pub cache_ttl: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl EngineOptions {
    /// Create new engine options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Blacklist/whitelist matching over message text
pub struct DomainEngine {
    blacklist: Blacklist,
    whitelist: Whitelist,
}

impl DomainEngine {
    /// Create an engine over arbitrary stores.
    pub fn new(
        blacklist_store: Arc<dyn DomainStore>,
        whitelist_store: Arc<dyn DomainStore>,
        options: EngineOptions,
    ) -> Self {
        Self {
            blacklist: Blacklist::new(blacklist_store, options.cache_ttl),
            whitelist: Whitelist::new(whitelist_store, options.cache_ttl),
        }
    }

    /// Create an engine over the flat files named in `config`.
    ///
    /// Missing files are created with default contents. Failure to create them
    /// is a configuration error and is returned.
    pub fn open(config: &Config) -> Result<Self> {
        let blacklist = FileStore::open(config.blacklist_path(), DEFAULT_BLACKLIST)?;
        let whitelist = FileStore::open(config.whitelist_path(), DEFAULT_WHITELIST)?;
        Ok(Self::new(
            Arc::new(blacklist),
            Arc::new(whitelist),
            EngineOptions::new().with_cache_ttl(config.cache_ttl()),
        ))
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Match a single URL against the blacklist.
    ///
    /// Scheme-less input is normalized first; anything that is not a link
    /// yields `None`.
    pub fn match_blacklist(&self, url: &str) -> Result<Option<BlacklistHit>> {
        match normalize(url) {
            Some(url) => self.blacklist.match_url(&url),
            None => Ok(None),
        }
    }

    /// Return the first blacklisted link in `text`, in message order.
    pub fn scan_message(&self, text: &str) -> Result<Option<BlacklistHit>> {
        let urls = extract_urls(text);
        if urls.is_empty() {
            return Ok(None);
        }

        let matcher = self.blacklist.matcher()?;
        Ok(urls.iter().find_map(|url| matcher.match_url(url)))
    }

    /// Check if `host` (or a parent domain) is whitelisted
    pub fn is_whitelisted(&self, host: &str) -> Result<bool> {
        self.whitelist.is_whitelisted(host)
    }

    /// Links in `text` whose host parses and is not whitelisted.
    pub fn non_whitelisted_urls(&self, text: &str) -> Result<Vec<String>> {
        let mut blocked = Vec::new();
        for url in extract_urls(text) {
            let Some(host) = host_of(&url) else {
                continue;
            };
            if !self.whitelist.is_whitelisted(&host)? {
                blocked.push(url);
            }
        }
        Ok(blocked)
    }

    /// Classify a single URL.
    pub fn classify_risk(&self, url: &str) -> Result<RiskReport> {
        let normalized = normalize(url);
        let domain = normalized.as_deref().and_then(host_of);

        let (Some(url), Some(domain)) = (normalized, domain) else {
            return Ok(RiskReport {
                risk_level: RiskLevel::Unknown,
                reasons: vec!["Unable to parse domain.".to_string()],
                domain: None,
            });
        };

        if let Some(hit) = self.blacklist.match_url(&url)? {
            let reason = match hit.match_type {
                MatchType::Domain => "Domain is blacklisted.",
                MatchType::Path => "Link path is blacklisted.",
            };
            return Ok(RiskReport {
                risk_level: RiskLevel::High,
                reasons: vec![reason.to_string()],
                domain: Some(domain),
            });
        }

        if PHISHING_KEYWORDS.iter().any(|w| domain.contains(w)) {
            return Ok(RiskReport {
                risk_level: RiskLevel::Medium,
                reasons: vec!["Domain contains common phishing keywords.".to_string()],
                domain: Some(domain),
            });
        }

        Ok(RiskReport {
            risk_level: RiskLevel::Safe,
            reasons: Vec::new(),
            domain: Some(domain),
        })
    }
}
