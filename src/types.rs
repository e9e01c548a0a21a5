use std::fmt;

use serde::Serialize;

/// A normalized blacklist rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlacklistRule {
    /// Blocks the host and all of its subdomains
    Domain { host: String },
    /// Blocks a path prefix under exactly one host
    Path { host: String, path_prefix: String },
}

impl BlacklistRule {
    /// Host this rule applies to
    pub fn host(&self) -> &str {
        match self {
            BlacklistRule::Domain { host } => host,
            BlacklistRule::Path { host, .. } => host,
        }
    }

    /// Canonical single-line form, as written to the backing store
    pub fn canonical(&self) -> String {
        match self {
            BlacklistRule::Domain { host } => host.clone(),
            BlacklistRule::Path { host, path_prefix } => format!("{}{}", host, path_prefix),
        }
    }
}

impl fmt::Display for BlacklistRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// How a blacklist hit was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Domain,
    Path,
}

/// Result of a blacklist lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlacklistHit {
    /// The rule that matched, in canonical form (`evil.com` or `evil.com/scam`)
    #[serde(rename = "match")]
    pub matched: String,
    pub match_type: MatchType,
    /// Host of the offending URL
    pub domain: String,
    /// The normalized URL that matched
    pub url: String,
}

impl BlacklistHit {
    /// User-facing noun for the hit: "link" for path rules, "domain" otherwise.
    pub fn label(&self) -> &'static str {
        match self.match_type {
            MatchType::Path => "link",
            MatchType::Domain => "domain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification for a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskReport {
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub domain: Option<String>,
}
