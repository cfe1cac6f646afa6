#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crumbsweep::engine::feed::{CategoryFeed, FeedSource, FreeCategories, PremiumCategories};
use crumbsweep::engine::policy::PolicyStore;
use crumbsweep::optout::OptOutOrchestrator;
use crumbsweep::service::SweepService;
use crumbsweep::storage::MemoryStore;
use crumbsweep::store::{CookieRecord, CookieStore, SameSite};

/// Feed source that always returns the same document.
pub struct StaticFeed(pub CategoryFeed);

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<CategoryFeed> {
        Ok(self.0.clone())
    }
}

/// Feed source that is always down.
pub struct FailingFeed;

#[async_trait]
impl FeedSource for FailingFeed {
    async fn fetch(&self) -> Result<CategoryFeed> {
        anyhow::bail!("feed offline")
    }
}

/// A feed with one known entry per category.
pub fn tracker_feed() -> CategoryFeed {
    CategoryFeed {
        free: FreeCategories {
            ads: vec!["doubleclick.net".to_string()],
            tracking: vec!["scorecardresearch.com".to_string()],
        },
        premium: PremiumCategories {
            trackers: vec!["adjust.com".to_string()],
            analytics: vec!["google-analytics.com".to_string()],
        },
    }
}

/// Third-party-looking cookie: domain-scoped, unrestricted SameSite.
pub fn cookie(domain: &str, name: &str) -> CookieRecord {
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

pub fn build_service(
    kv: Arc<MemoryStore>,
    jar: Arc<dyn CookieStore>,
    feed: Arc<dyn FeedSource>,
) -> Arc<SweepService> {
    let policy = PolicyStore::new(kv.clone(), feed);
    let optout = OptOutOrchestrator::new(
        "config/iab-vendors.json",
        "config/cmp-selectors.json",
        None,
    );
    Arc::new(SweepService::new(kv, jar, policy, optout))
}
