//! Orbit LinkGuard - link moderation engine for the Orbit Discord bot
//!
//! This library decides whether links posted in chat are allowed:
//! - Link extraction from free text (scheme links, `www.` links, bare domains)
//! - Domain blacklist with subdomain coverage and path-prefix rules
//! - Domain whitelist, enforced per guild/channel when LinkGuard is on
//! - Coarse risk classification for a single URL
//! - Word similarity checks against seed phrases
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use orbit_linkguard::{DomainEngine, EngineOptions, MatchType, MemoryStore};
//!
//! let blacklist = Arc::new(MemoryStore::with_entries(["evil.com", "bad.net/scam"]));
//! let whitelist = Arc::new(MemoryStore::with_entries(["docs.google.com"]));
//! let engine = DomainEngine::new(blacklist, whitelist, EngineOptions::new());
//!
//! let hit = engine.scan_message("join evil.com now!").unwrap().unwrap();
//! assert_eq!(hit.matched, "evil.com");
//! assert_eq!(hit.match_type, MatchType::Domain);
//!
//! assert!(engine.is_whitelisted("forms.docs.google.com").unwrap());
//! ```
//!
//! # List Syntax
//!
//! Blacklist and whitelist files hold one entry per line. Blank lines and
//! lines starting with `#` are ignored.
//!
//! | Entry | Blacklist meaning |
//! |-------|-------------------|
//! | `evil.com` | `evil.com` and every subdomain |
//! | `https://www.evil.com/` | Same as `evil.com` |
//! | `evil.com/scam` | `/scam` and anything below it, on `evil.com` only |
//!
//! Whitelist entries are reduced to their host: `medal.tv/clips` whitelists
//! `medal.tv` and its subdomains.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod link;
pub mod list;
pub mod matcher;
pub mod parser;
pub mod settings;
pub mod similarity;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use cache::{TtlCache, DEFAULT_CACHE_TTL};
pub use config::{Config, LinkGuardConfig, WordBlockerConfig};
pub use engine::{DomainEngine, EngineOptions, PHISHING_KEYWORDS};
pub use error::{LinkGuardError, Result, StoreErrorKind};
pub use link::{extract_candidates, extract_urls, host_of, normalize, path_of};
pub use list::{Blacklist, DomainList, ListEntry, Whitelist, WhitelistEntry};
pub use matcher::{BlacklistMatcher, HostMatcher, WhitelistMatcher};
pub use parser::{parse_host, parse_rule, parse_rules};
pub use types::{BlacklistHit, BlacklistRule, MatchType, RiskLevel, RiskReport};

// Re-export store types
pub use store::{DomainStore, FileStore, MemoryStore, DEFAULT_BLACKLIST, DEFAULT_WHITELIST};

// Re-export moderation types
pub use guard::{LinkGuard, MessageContext, Verdict};
pub use settings::{GuildSettings, SettingsStore};
pub use similarity::{SimilarityHit, SimilarityIndex, SimilarityStatus};
