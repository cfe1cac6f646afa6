//! The sweep itself: enumerate, classify, remove.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::{classify, PolicyState, Verdict};
use crate::error::SweepError;
use crate::store::{CookieRecord, CookieStore};

/// Outcome counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub removed: u64,
    pub kept: u64,
    pub failed: u64,
}

pub struct CookieCleaner {
    cookies: Arc<dyn CookieStore>,
}

impl CookieCleaner {
    pub fn new(cookies: Arc<dyn CookieStore>) -> Self {
        Self { cookies }
    }

    /// Runs one full pass over the jar in enumeration order. Failing to
    /// enumerate aborts the sweep; failing to remove a single cookie only
    /// bumps the `failed` counter and the pass keeps going.
    pub async fn sweep(&self, policy: &PolicyState) -> Result<SweepStats, SweepError> {
        let cookies = self
            .cookies
            .enumerate()
            .await
            .map_err(|e| SweepError::Enumeration(format!("{e:#}")))?;

        let mut stats = SweepStats::default();
        for cookie in &cookies {
            match classify(cookie, policy) {
                Verdict::Keep => stats.kept += 1,
                Verdict::Delete => {
                    let url = removal_url(cookie);
                    match self.cookies.remove(&url, &cookie.name).await {
                        Ok(()) => {
                            debug!(domain = %cookie.domain, name = %cookie.name, "Removed cookie");
                            stats.removed += 1;
                        }
                        Err(e) => {
                            warn!(
                                domain = %cookie.domain,
                                name = %cookie.name,
                                "Failed to remove cookie: {e:#}"
                            );
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        info!(
            "Sweep complete. Removed {} of {} cookies ({} kept, {} failed).",
            stats.removed,
            cookies.len(),
            stats.kept,
            stats.failed
        );
        Ok(stats)
    }
}

/// Rebuilds the origin URL a cookie is addressed by: scheme from the secure
/// flag, host from the dot-stripped domain, then the cookie path.
pub fn removal_url(cookie: &CookieRecord) -> String {
    let scheme = if cookie.secure { "https" } else { "http" };
    let host = crate::engine::domain::normalize_cookie_domain(&cookie.domain);
    format!("{scheme}://{host}{path}", path = cookie.path)
}
