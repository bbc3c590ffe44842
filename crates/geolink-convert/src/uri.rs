//! Minimal decoded URI model the pattern engine evaluates against.
//!
//! Deliberately not the `url` crate: provider links include non-hierarchical
//! schemes (`geo:`, `ge0://`, `comgooglemaps://`) and scheme-less shares
//! (`maps.google.com/...`) that we want to split leniently rather than
//! validate strictly.

use percent_encoding::percent_decode_str;

/// A shared link split into its matchable components, percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    raw: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub fragment: String,
    query: Vec<(String, String)>,
}

impl Uri {
    /// Splits `raw` into components. Never fails: unrecognizable text ends
    /// up in `path` so full-text rules still see it.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut rest = raw;

        let mut scheme = String::new();
        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            if !candidate.is_empty()
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
                && candidate.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                scheme = candidate.to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        let mut fragment = String::new();
        if let Some(hash) = rest.find('#') {
            fragment = decode(&rest[hash + 1..]);
            rest = &rest[..hash];
        }

        let mut query = Vec::new();
        if let Some(question) = rest.find('?') {
            for pair in rest[question + 1..].split('&') {
                if pair.is_empty() {
                    continue;
                }
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                query.push((decode_query(key), decode_query(value)));
            }
            rest = &rest[..question];
        }

        let mut host = String::new();
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find('/').unwrap_or(after.len());
            host = normalize_host(&after[..end]);
            rest = &after[end..];
        } else if scheme.is_empty() && looks_like_host(rest) {
            let end = rest.find('/').unwrap_or(rest.len());
            host = normalize_host(&rest[..end]);
            rest = &rest[end..];
        }

        Self {
            raw: raw.to_owned(),
            scheme,
            host,
            path: decode(rest),
            fragment,
            query,
        }
    }

    /// The original trimmed input string.
    #[must_use]
    pub fn full(&self) -> &str {
        &self.raw
    }

    /// First value of a query parameter, decoded.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty path segments.
    #[must_use]
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Resolves a redirect target against the URI it came from.
///
/// Absolute targets pass through; host-relative targets (`/path`) are
/// grafted onto the base's scheme and host. Anything else is returned
/// as-is and left to the guard regexes to accept or reject.
#[must_use]
pub fn resolve_reference(base: &str, reference: &str) -> String {
    if reference.contains("://") || !reference.starts_with('/') {
        return reference.to_owned();
    }
    let Some(scheme_split) = base.find("://") else {
        return reference.to_owned();
    };
    let scheme = &base[..scheme_split];
    let remainder = &base[scheme_split + 3..];
    let host_end = remainder.find('/').unwrap_or(remainder.len());
    let host = &remainder[..host_end];
    format!("{scheme}://{host}{reference}")
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Query components additionally decode `+` as space.
fn decode_query(s: &str) -> String {
    decode(&s.replace('+', " "))
}

fn normalize_host(authority: &str) -> String {
    // Strip userinfo and port; matching only ever needs the hostname.
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    host.to_ascii_lowercase()
}

/// Heuristic for scheme-less shares: `maps.google.com/foo` has a dotted
/// first component, `N-68.6,E-152.7` does not parse as one.
fn looks_like_host(s: &str) -> bool {
    let end = s.find('/').unwrap_or(s.len());
    let candidate = &s[..end];
    !candidate.is_empty()
        && candidate.contains('.')
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
}
