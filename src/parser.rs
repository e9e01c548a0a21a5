use url::Url;

use crate::error::{LinkGuardError, Result};
use crate::link::normalize_path;
use crate::types::BlacklistRule;

/// Iterate the rule lines of a store file.
///
/// Yields `(line_number, trimmed_line)` with 1-based line numbers. Blank lines
/// and `#` comments are skipped. Handles both `\n` and `\r\n` endings.
pub fn rule_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse a single blacklist rule.
///
/// Accepted forms:
/// - `example.com` - whole-domain rule
/// - `https://example.com/path` - path-prefix rule (domain rule if path is `/`)
/// - `example.com/path` - path-prefix rule without scheme
pub fn parse_rule(line: &str) -> Result<BlacklistRule> {
    let (host, path) = split_rule(line)?;
    if path == "/" {
        Ok(BlacklistRule::Domain { host })
    } else {
        Ok(BlacklistRule::Path {
            host,
            path_prefix: path,
        })
    }
}

/// Parse a whitelist entry. Only the host is kept; any path is ignored.
pub fn parse_host(line: &str) -> Result<String> {
    split_rule(line).map(|(host, _)| host)
}

fn split_rule(line: &str) -> Result<(String, String)> {
    let line = line.trim().to_lowercase();
    if line.is_empty() || line.starts_with('#') {
        return Err(LinkGuardError::InvalidRule(format!(
            "Not a rule: '{}'",
            line
        )));
    }

    let with_scheme = if line.starts_with("http://") || line.starts_with("https://") {
        line.clone()
    } else {
        format!("https://{}", line)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| LinkGuardError::InvalidRule(format!("'{}': {}", line, e)))?;

    let host = url
        .host_str()
        .map(|h| h.strip_prefix("www.").unwrap_or(h).to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LinkGuardError::InvalidRule(format!("'{}': missing host", line)))?;

    // Lowercase after parsing so percent escapes share the form URL paths get
    Ok((host, normalize_path(&url.path().to_lowercase())))
}

/// Parse all blacklist rules in `text`, skipping lines that do not parse.
pub fn parse_rules(text: &str) -> Vec<BlacklistRule> {
    rule_lines(text)
        .filter_map(|(line_num, line)| match parse_rule(line) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "skipping blacklist rule");
                None
            }
        })
        .collect()
}
