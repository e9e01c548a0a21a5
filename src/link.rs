//! Link extraction and normalization.
//!
//! Message text is scanned for two lexical classes:
//! - scheme-qualified links (`https://…`, `http://…`, `www.…`)
//! - bare domain-like tokens (`example.com`, `sub.example.co.uk:8080/path`)
//!
//! Nothing in this module returns an error. Text that does not look like a
//! link simply produces no candidates, and unparsable URLs yield `None`.

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Scheme-qualified link or `www.` prefixed link
static SCHEME_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<]+")
        .expect("SCHEME_URL_PATTERN: hardcoded regex is invalid")
});

/// Bare domain: (label.)+tld[:port][/path]
static BARE_DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\b(?::\d{2,5})?(?:/[^\s<]*)?",
    )
    .expect("BARE_DOMAIN_PATTERN: hardcoded regex is invalid")
});

/// Host-looking prefix of a scheme-less token
static DOMAIN_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}(?::\d{1,5})?(?:[/?#]|$)",
    )
    .expect("DOMAIN_PREFIX_PATTERN: hardcoded regex is invalid")
});

/// Characters stripped from the end of a candidate token
const TRAILING_PUNCTUATION: &[char] = &[')', ',', '.', ';', '!', '?'];

/// Extract raw link candidates from message text.
///
/// Candidates are returned de-duplicated, in the order they appear in the
/// text. A token immediately preceded by `@` is skipped so the domain part of
/// an email address is not reported. Bare-domain tokens that overlap a
/// scheme-qualified link are not reported twice.
pub fn extract_candidates(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    // All scheme spans, including skipped ones, so the bare scan can't re-report them
    let scheme_spans: Vec<Range<usize>> =
        SCHEME_URL_PATTERN.find_iter(text).map(|m| m.range()).collect();
    let mut found: Vec<Range<usize>> = scheme_spans
        .iter()
        .filter(|r| !preceded_by_at(text, r.start))
        .cloned()
        .collect();

    for m in BARE_DOMAIN_PATTERN.find_iter(text) {
        if preceded_by_at(text, m.start()) {
            continue;
        }
        let range = m.range();
        if scheme_spans.iter().any(|s| overlaps(s, &range)) {
            continue;
        }
        found.push(range);
    }

    found.sort_by_key(|r| r.start);

    let mut seen = HashSet::with_capacity(found.len());
    found
        .into_iter()
        .map(|r| &text[r])
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

fn preceded_by_at(text: &str, start: usize) -> bool {
    start > 0 && text.as_bytes()[start - 1] == b'@'
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Strip trailing punctuation and infer a scheme.
///
/// Returns `None` when the token is not a navigable address.
pub fn normalize(token: &str) -> Option<String> {
    let s = token.trim().trim_end_matches(TRAILING_PUNCTUATION);
    if s.is_empty() {
        return None;
    }

    let lower = s.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(s.to_string());
    }
    if lower.starts_with("www.") || DOMAIN_PREFIX_PATTERN.is_match(s) {
        return Some(format!("https://{}", s));
    }

    None
}

/// Lowercased hostname without a leading `www.`, or `None` if `url` does not parse.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// Normalized path of `url`: `/` for root, otherwise one leading slash and
/// no trailing slash. Unparsable URLs are treated as root.
pub fn path_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => normalize_path(parsed.path()),
        Err(_) => "/".to_string(),
    }
}

pub(crate) fn normalize_path(path: &str) -> String {
    let inner = path.trim_start_matches('/').trim_end_matches('/');
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", inner)
    }
}

/// Extract, normalize and drop anything that is not a navigable address.
pub fn extract_urls(text: &str) -> Vec<String> {
    extract_candidates(text)
        .iter()
        .filter_map(|token| normalize(token))
        .collect()
}
