//! Domain validation and suffix matching.
//!
//! Matching is a literal tail comparison on normalized strings, not a
//! registrable-domain (PSL) lookup. A list entry of `example.com` therefore
//! also captures `notexample.com`; users who need tighter scoping can list
//! the full host.

/// Top-level domains accepted by the validator. A fixed list rather than a
/// registry lookup, so entries never depend on network state.
const KNOWN_TLDS: &[&str] = &[
    "com", "net", "org", "io", "co", "uk", "de", "fr", "gr", "eu", "app",
    "site", "ai", "dev", "biz", "info", "me", "tv",
];

/// Normalizes a user-supplied list entry: trims surrounding whitespace and
/// lower-cases. Validation happens separately.
pub fn normalize_list_entry(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes a cookie domain for matching: strips at most one leading dot
/// (the domain-cookie marker) and lower-cases.
pub fn normalize_cookie_domain(raw: &str) -> String {
    raw.strip_prefix('.').unwrap_or(raw).to_lowercase()
}

/// Checks whether `candidate` is a plausible registrable domain: at least
/// two labels of `[a-z0-9-]`, an alphabetic final label of two or more
/// characters, and a recognized TLD. `localhost` and bare hostnames are
/// rejected. Total over arbitrary input, never panics.
pub fn is_valid_domain(candidate: &str) -> bool {
    let domain = candidate.to_lowercase();
    if domain.is_empty() || domain == "localhost" {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let last = labels.len() - 1;
    for (i, label) in labels.iter().enumerate() {
        if label.is_empty() {
            return false;
        }
        if i == last {
            if label.len() < 2 || !label.chars().all(|c| c.is_ascii_alphabetic()) {
                return false;
            }
        } else if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return false;
        }
    }

    KNOWN_TLDS.contains(&labels[last])
}

/// Suffix match between a cookie domain and a normalized list entry.
/// `.ads.example.com` matches the entry `example.com`; so does the exact
/// host `example.com` itself.
pub fn domain_matches(cookie_domain: &str, entry: &str) -> bool {
    normalize_cookie_domain(cookie_domain).ends_with(entry)
}
