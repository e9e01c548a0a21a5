//! Blacklist matcher.
//!
//! Uses a HashSet for whole-domain rules (one lookup per domain level) and a
//! HashMap from host to path prefixes, ordered longest-first so the most
//! specific prefix wins.

use std::collections::{HashMap, HashSet};

use super::{host_suffixes, HostMatcher};
use crate::link::{host_of, path_of};
use crate::types::{BlacklistHit, BlacklistRule, MatchType};

/// Derived lookup structure for blacklist rules
#[derive(Debug, Clone, Default)]
pub struct BlacklistMatcher {
    /// Whole-domain rules
    domains: HashSet<String>,
    /// host -> path prefixes, longest first
    paths: HashMap<String, Vec<String>>,
}

impl BlacklistMatcher {
    /// Build a matcher from normalized rules. Duplicate rules are collapsed.
    pub fn new(rules: &[BlacklistRule]) -> Self {
        let mut domains = HashSet::new();
        let mut paths: HashMap<String, Vec<String>> = HashMap::new();

        for rule in rules {
            match rule {
                BlacklistRule::Domain { host } => {
                    domains.insert(host.clone());
                }
                BlacklistRule::Path { host, path_prefix } => {
                    let prefixes = paths.entry(host.clone()).or_default();
                    if !prefixes.contains(path_prefix) {
                        prefixes.push(path_prefix.clone());
                    }
                }
            }
        }

        for prefixes in paths.values_mut() {
            // Stable: equal lengths keep declaration order
            prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
        }

        Self { domains, paths }
    }

    /// Find the blacklisted domain covering `host`, if any.
    ///
    /// Walks from the host itself up to the registrable parents. A bare
    /// top-level label is only checked when it is the whole host.
    pub fn match_domain<'a>(&self, host: &'a str) -> Option<&'a str> {
        host_suffixes(host)
            .filter(|suffix| *suffix == host || suffix.contains('.'))
            .find(|suffix| self.domains.contains(*suffix))
    }

    /// Find the longest path prefix registered under exactly `host` that covers `path`.
    pub fn match_path(&self, host: &str, path: &str) -> Option<&str> {
        let prefixes = self.paths.get(host)?;
        let path = path.to_lowercase();
        prefixes
            .iter()
            .find(|prefix| path_has_prefix(&path, prefix))
            .map(String::as_str)
    }

    /// Match a normalized URL. Domain rules take precedence over path rules.
    pub fn match_url(&self, url: &str) -> Option<BlacklistHit> {
        let host = host_of(url)?;

        if let Some(matched) = self.match_domain(&host) {
            return Some(BlacklistHit {
                matched: matched.to_string(),
                match_type: MatchType::Domain,
                domain: host.clone(),
                url: url.to_string(),
            });
        }

        let path = path_of(url);
        let prefix = self.match_path(&host, &path)?;
        Some(BlacklistHit {
            matched: format!("{}{}", host, prefix),
            match_type: MatchType::Path,
            domain: host,
            url: url.to_string(),
        })
    }

    /// Number of whole-domain rules
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Number of path-prefix rules
    pub fn path_count(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    /// Total number of distinct rules
    pub fn len(&self) -> usize {
        self.domain_count() + self.path_count()
    }

    /// Check if the matcher has no rules
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.paths.is_empty()
    }
}

impl HostMatcher for BlacklistMatcher {
    fn matches(&self, host: &str) -> bool {
        self.match_domain(host).is_some()
    }
}

fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_rule;

    fn matcher(lines: &[&str]) -> BlacklistMatcher {
        let rules: Vec<_> = lines.iter().map(|l| parse_rule(l).unwrap()).collect();
        BlacklistMatcher::new(&rules)
    }

    #[test]
    fn test_empty_matcher() {
        let m = BlacklistMatcher::new(&[]);
        assert!(m.is_empty());
        assert!(m.match_url("https://evil.com").is_none());
    }

    #[test]
    fn test_domain_and_subdomain_match() {
        let m = matcher(&["evil.com"]);

        let hit = m.match_url("https://evil.com").unwrap();
        assert_eq!(hit.match_type, MatchType::Domain);
        assert_eq!(hit.matched, "evil.com");

        let hit = m.match_url("https://a.b.evil.com/x").unwrap();
        assert_eq!(hit.match_type, MatchType::Domain);
        assert_eq!(hit.matched, "evil.com");
        assert_eq!(hit.domain, "a.b.evil.com");

        assert!(m.match_url("https://notevil.com").is_none());
        assert!(m.match_url("https://evil.com.org").is_none());
    }

    #[test]
    fn test_most_specific_suffix_reported() {
        let m = matcher(&["evil.com", "sub.evil.com"]);
        let hit = m.match_url("https://x.sub.evil.com").unwrap();
        assert_eq!(hit.matched, "sub.evil.com");
    }

    #[test]
    fn test_tld_rule_only_matches_itself() {
        let m = matcher(&["localhost", "com"]);
        assert!(m.match_url("http://localhost:3000").is_some());
        assert!(m.match_url("https://example.com").is_none());
    }

    #[test]
    fn test_path_rule() {
        let m = matcher(&["evil.com/scam"]);

        assert!(m.match_url("http://evil.com/safe").is_none());
        assert!(m.match_url("http://evil.com/scammer").is_none());
        assert!(m.match_url("http://evil.com").is_none());

        let hit = m.match_url("http://evil.com/scam/123").unwrap();
        assert_eq!(hit.match_type, MatchType::Path);
        assert_eq!(hit.matched, "evil.com/scam");

        let hit = m.match_url("http://evil.com/scam").unwrap();
        assert_eq!(hit.match_type, MatchType::Path);
    }

    #[test]
    fn test_non_ascii_path_rule() {
        let m = matcher(&["evil.com/приз"]);

        let hit = m.match_url("http://evil.com/приз/123").unwrap();
        assert_eq!(hit.match_type, MatchType::Path);
        assert!(m.match_url("http://evil.com/%D0%BF%D1%80%D0%B8%D0%B7").is_some());
        assert!(m.match_url("http://evil.com/%d0%bf%d1%80%d0%b8%d0%b7/x").is_some());
        assert!(m.match_url("http://evil.com/прize").is_none());
    }

    #[test]
    fn test_path_rule_is_host_scoped() {
        let m = matcher(&["evil.com/scam"]);
        assert!(m.match_url("http://sub.evil.com/scam").is_none());
    }

    #[test]
    fn test_path_rule_case_insensitive() {
        let m = matcher(&["evil.com/Scam"]);
        assert!(m.match_url("http://evil.com/SCAM/1").is_some());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let m = matcher(&["evil.com/a", "evil.com/a/b"]);
        let hit = m.match_url("https://evil.com/a/b/c").unwrap();
        assert_eq!(hit.matched, "evil.com/a/b");
        let hit = m.match_url("https://evil.com/a/x").unwrap();
        assert_eq!(hit.matched, "evil.com/a");
    }

    #[test]
    fn test_domain_rule_wins_over_path_rule() {
        let m = matcher(&["evil.com/scam", "evil.com"]);
        let hit = m.match_url("https://evil.com/scam/1").unwrap();
        assert_eq!(hit.match_type, MatchType::Domain);
    }

    #[test]
    fn test_counts_and_dedup() {
        let m = matcher(&["evil.com", "EVIL.com", "evil.com/a", "evil.com/a/"]);
        assert_eq!(m.domain_count(), 1);
        assert_eq!(m.path_count(), 1);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_host_matcher_trait() {
        let m = matcher(&["evil.com"]);
        assert!(m.matches("www2.evil.com"));
        assert!(!m.matches("good.com"));
    }

    #[test]
    fn test_unparsable_url() {
        let m = matcher(&["evil.com"]);
        assert!(m.match_url("evil.com").is_none());
        assert!(m.match_url("::::").is_none());
    }
}
