//! Allow/deny policy lists.
//!
//! Two sources feed the effective policy: entries the user typed in, which
//! are persisted, and entries contributed by the category feed, which are
//! merged at load time only. Keeping feed entries out of storage means a
//! shrinking feed actually shrinks the denylist instead of leaving stale
//! domains behind.

use std::sync::Arc;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::engine::domain;
use crate::engine::feed::{CategoryFeed, FeedSource};
use crate::error::{ListName, SweepError};
use crate::storage::{KeyValueStore, KEY_ALLOW_LIST, KEY_DENY_LIST};

/// Domains most users rely on daily. Seeded into the allowlist on first run
/// only; once the user has saved any change, storage is authoritative.
pub const DEFAULT_ALLOW_LIST: &[&str] =
    &["google.com", "amazon.com", "facebook.com", "hubspot.com"];

type DomainSet = FxHashSet<Box<str>>;

/// One immutable snapshot of the effective policy. `deny` holds the user's
/// entries plus the feed contribution; `deny_user` tracks what actually
/// gets persisted.
#[derive(Debug, Clone, Default)]
pub struct PolicyState {
    allow: DomainSet,
    deny_user: DomainSet,
    deny: DomainSet,
}

impl PolicyState {
    /// Builds a snapshot straight from entry lists, without a feed. The
    /// entries are normalized the same way stored ones are.
    pub fn from_lists(
        allow: impl IntoIterator<Item = String>,
        deny: impl IntoIterator<Item = String>,
    ) -> Self {
        let allow = collect_normalized(allow);
        let deny_user = collect_normalized(deny);
        let deny = deny_user.clone();
        Self {
            allow,
            deny_user,
            deny,
        }
    }

    /// First allowlist entry the cookie domain tail-matches, if any.
    pub fn matching_allow(&self, cookie_domain: &str) -> Option<&str> {
        self.allow
            .iter()
            .find(|entry| domain::domain_matches(cookie_domain, entry))
            .map(|entry| entry.as_ref())
    }

    /// First effective denylist entry the cookie domain tail-matches.
    pub fn matching_deny(&self, cookie_domain: &str) -> Option<&str> {
        self.deny
            .iter()
            .find(|entry| domain::domain_matches(cookie_domain, entry))
            .map(|entry| entry.as_ref())
    }

    /// User allowlist, sorted for stable output.
    pub fn allow_view(&self) -> Vec<String> {
        sorted_view(&self.allow)
    }

    /// Effective denylist (user entries plus feed), sorted.
    pub fn deny_view(&self) -> Vec<String> {
        sorted_view(&self.deny)
    }

    /// Only the user's own deny entries, i.e. what persistence holds.
    pub fn deny_user_view(&self) -> Vec<String> {
        sorted_view(&self.deny_user)
    }
}

fn collect_normalized(entries: impl IntoIterator<Item = String>) -> DomainSet {
    entries
        .into_iter()
        .map(|e| domain::normalize_list_entry(&e).into_boxed_str())
        .collect()
}

fn sorted_view(set: &DomainSet) -> Vec<String> {
    let mut view: Vec<String> = set.iter().map(|e| e.to_string()).collect();
    view.sort();
    view
}

/// Owns the persisted lists and produces merged [`PolicyState`] snapshots.
pub struct PolicyStore {
    kv: Arc<dyn KeyValueStore>,
    feed: Arc<dyn FeedSource>,
    // Serializes read-modify-write of the persisted lists.
    write_guard: tokio::sync::Mutex<()>,
}

impl PolicyStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, feed: Arc<dyn FeedSource>) -> Self {
        Self {
            kv,
            feed,
            write_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Reads the persisted lists and merges the feed slice for the tier.
    /// A feed outage degrades to the user's own entries rather than
    /// failing the load.
    pub async fn load(&self, elevated: bool) -> Result<PolicyState> {
        let allow = match self.read_list(KEY_ALLOW_LIST).await? {
            Some(entries) => entries,
            None => {
                debug!("No stored allowlist, seeding defaults");
                DEFAULT_ALLOW_LIST
                    .iter()
                    .map(|d| Box::from(*d))
                    .collect()
            }
        };
        let deny_user = self.read_list(KEY_DENY_LIST).await?.unwrap_or_default();

        let feed = match self.feed.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Category feed unavailable, continuing with user entries only: {e:#}");
                CategoryFeed::default()
            }
        };

        let mut deny = deny_user.clone();
        for entry in feed.deny_entries(elevated) {
            deny.insert(domain::normalize_list_entry(entry).into_boxed_str());
        }

        Ok(PolicyState {
            allow,
            deny_user,
            deny,
        })
    }

    pub async fn add_allow(&self, raw: &str, elevated: bool) -> Result<Vec<String>, SweepError> {
        let _guard = self.write_guard.lock().await;
        let domain = domain::normalize_list_entry(raw);
        if !domain::is_valid_domain(&domain) {
            return Err(SweepError::InvalidDomain { domain });
        }
        let current = self.load(elevated).await.map_err(SweepError::storage)?;
        if current.deny.contains(domain.as_str()) {
            return Err(SweepError::ListConflict {
                domain,
                list: ListName::Deny,
            });
        }
        if current.allow.contains(domain.as_str()) {
            return Ok(current.allow_view());
        }

        let mut next = current.clone();
        next.allow.insert(domain.into_boxed_str());
        let view = next.allow_view();
        self.persist(&next).await?;
        Ok(view)
    }

    pub async fn add_deny(&self, raw: &str, elevated: bool) -> Result<Vec<String>, SweepError> {
        let _guard = self.write_guard.lock().await;
        let domain = domain::normalize_list_entry(raw);
        if !domain::is_valid_domain(&domain) {
            return Err(SweepError::InvalidDomain { domain });
        }
        let current = self.load(elevated).await.map_err(SweepError::storage)?;
        if current.allow.contains(domain.as_str()) {
            return Err(SweepError::ListConflict {
                domain,
                list: ListName::Allow,
            });
        }
        if current.deny.contains(domain.as_str()) {
            return Ok(current.deny_view());
        }

        let mut next = current.clone();
        next.deny_user.insert(domain.clone().into_boxed_str());
        next.deny.insert(domain.into_boxed_str());
        let view = next.deny_view();
        self.persist(&next).await?;
        Ok(view)
    }

    /// Removal needs no validation; an absent domain is simply a no-op.
    pub async fn remove_allow(&self, raw: &str, elevated: bool) -> Result<Vec<String>, SweepError> {
        let _guard = self.write_guard.lock().await;
        let domain = domain::normalize_list_entry(raw);
        let current = self.load(elevated).await.map_err(SweepError::storage)?;

        let mut next = current.clone();
        let changed = next.allow.remove(domain.as_str());
        let view = next.allow_view();
        if changed {
            self.persist(&next).await?;
        }
        Ok(view)
    }

    /// Removes a user deny entry. A domain the feed contributes will be
    /// back on the next load; only user entries are deletable for good.
    pub async fn remove_deny(&self, raw: &str, elevated: bool) -> Result<Vec<String>, SweepError> {
        let _guard = self.write_guard.lock().await;
        let domain = domain::normalize_list_entry(raw);
        let current = self.load(elevated).await.map_err(SweepError::storage)?;

        let mut next = current.clone();
        let user_changed = next.deny_user.remove(domain.as_str());
        next.deny.remove(domain.as_str());
        let view = next.deny_view();
        // Dropping a feed-contributed domain changes only this snapshot;
        // storage holds user entries alone, so there is nothing to write.
        if user_changed {
            self.persist(&next).await?;
        }
        Ok(view)
    }

    /// Persists the user lists in one write.
    async fn persist(&self, next: &PolicyState) -> Result<(), SweepError> {
        let allow_json =
            serde_json::to_string(&next.allow_view()).map_err(SweepError::storage)?;
        let deny_json =
            serde_json::to_string(&next.deny_user_view()).map_err(SweepError::storage)?;
        self.kv
            .set_many(&[(KEY_ALLOW_LIST, allow_json), (KEY_DENY_LIST, deny_json)])
            .await
            .map_err(SweepError::storage)
    }

    async fn read_list(&self, key: &str) -> Result<Option<DomainSet>> {
        let Some(raw) = self
            .kv
            .get(key)
            .await
            .with_context(|| format!("failed to read {key}"))?
        else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => Ok(Some(collect_normalized(entries))),
            Err(e) => {
                warn!("Stored {key} is not a valid list ({e}), treating as absent");
                Ok(None)
            }
        }
    }
}
