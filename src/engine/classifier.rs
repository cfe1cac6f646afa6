//! Per-cookie keep-or-delete decisions.
//!
//! Rules apply in a fixed order and the first hit wins: allowlist, then
//! denylist, then the cookie's own attributes, then a name heuristic. A
//! cookie nothing vouches for is deleted.

use crate::engine::policy::PolicyState;
use crate::store::{CookieRecord, SameSite};
use tracing::debug;

/// Name fragments that usually indicate a functional cookie (session
/// handling, carts, site preferences). Compared against the lower-cased
/// cookie name.
pub const FUNCTIONAL_NAME_HINTS: &[&str] = &[
    "session", "auth", "token", "sid", "login", "cart", "pref", "locale", "user_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Delete,
}

pub fn classify(cookie: &CookieRecord, policy: &PolicyState) -> Verdict {
    if let Some(entry) = policy.matching_allow(&cookie.domain) {
        debug!(domain = %cookie.domain, entry, "cookie kept by allowlist");
        return Verdict::Keep;
    }
    if let Some(entry) = policy.matching_deny(&cookie.domain) {
        debug!(domain = %cookie.domain, entry, "cookie marked by denylist");
        return Verdict::Delete;
    }

    // Host-scoped and SameSite-restricted cookies read as first-party
    // functionality.
    if cookie.host_only {
        return Verdict::Keep;
    }
    if cookie.same_site != SameSite::NoRestriction {
        return Verdict::Keep;
    }

    let name = cookie.name.to_lowercase();
    if FUNCTIONAL_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        return Verdict::Keep;
    }

    Verdict::Delete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(domain: &str, name: &str) -> CookieRecord {
        CookieRecord {
            domain: domain.to_string(),
            name: name.to_string(),
            value: "value".to_string(),
            path: "/".to_string(),
            secure: false,
            host_only: false,
            same_site: SameSite::NoRestriction,
        }
    }

    fn policy(allow: &[&str], deny: &[&str]) -> PolicyState {
        PolicyState::from_lists(
            allow.iter().map(|s| s.to_string()),
            deny.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn test_allowlist_wins_over_everything() {
        let policy = policy(&["example.com"], &["example.com"]);
        let c = cookie(".ads.example.com", "random");
        assert_eq!(classify(&c, &policy), Verdict::Keep);
    }

    #[test]
    fn test_denylist_deletes_functional_looking_cookies() {
        let policy = policy(&[], &["tracker.net"]);
        let mut c = cookie(".tracker.net", "session_id");
        c.host_only = true;
        c.same_site = SameSite::Strict;
        assert_eq!(classify(&c, &policy), Verdict::Delete);
    }

    #[test]
    fn test_host_only_cookie_is_kept() {
        let policy = policy(&[], &[]);
        let mut c = cookie("shop.example.com", "random");
        c.host_only = true;
        assert_eq!(classify(&c, &policy), Verdict::Keep);
    }

    #[test]
    fn test_same_site_restriction_is_kept() {
        let policy = policy(&[], &[]);
        let mut c = cookie(".example.com", "random");
        c.same_site = SameSite::Lax;
        assert_eq!(classify(&c, &policy), Verdict::Keep);
        c.same_site = SameSite::Strict;
        assert_eq!(classify(&c, &policy), Verdict::Keep);
    }

    #[test]
    fn test_name_hints_are_case_insensitive() {
        let policy = policy(&[], &[]);
        assert_eq!(
            classify(&cookie(".example.com", "JSESSIONID"), &policy),
            Verdict::Keep
        );
        assert_eq!(
            classify(&cookie(".example.com", "cart_items"), &policy),
            Verdict::Keep
        );
        assert_eq!(
            classify(&cookie(".example.com", "USER_ID"), &policy),
            Verdict::Keep
        );
    }

    #[test]
    fn test_unvouched_third_party_cookie_is_deleted() {
        let policy = policy(&[], &[]);
        let c = cookie(".cdn.adnetwork.net", "xyz123");
        assert_eq!(classify(&c, &policy), Verdict::Delete);
    }

    #[test]
    fn test_opaque_value_gets_no_special_treatment() {
        // Opaque identifier payloads fall through to the same default as
        // any other unvouched cookie, whatever the tier.
        let policy = policy(&[], &[]);
        let mut c = cookie(".example.com", "xz");
        c.value = "550e8400-e29b-41d4-a716-446655440000".to_string();
        assert_eq!(classify(&c, &policy), Verdict::Delete);
    }
}
