//! Curated tracker-category feed.
//!
//! The feed ships category groups in two bands: a free band everyone gets
//! and a premium band merged in for elevated-tier installs. Sources are
//! swappable; the HTTP source caches parsed feeds so repeated policy loads
//! do not hammer the endpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use tracing::debug;

const FEED_USER_AGENT: &str = "crumbsweep/0.1";
const FEED_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FreeCategories {
    #[serde(default)]
    pub ads: Vec<String>,
    #[serde(default)]
    pub tracking: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PremiumCategories {
    #[serde(default)]
    pub trackers: Vec<String>,
    #[serde(default)]
    pub analytics: Vec<String>,
}

/// Parsed feed document. Every group is optional so a partial feed still
/// loads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryFeed {
    #[serde(default)]
    pub free: FreeCategories,
    #[serde(default)]
    pub premium: PremiumCategories,
}

impl CategoryFeed {
    /// Domains this feed contributes to the effective denylist. The premium
    /// band is only included for elevated installs.
    pub fn deny_entries(&self, elevated: bool) -> Vec<&str> {
        let mut entries: Vec<&str> = self
            .free
            .ads
            .iter()
            .chain(self.free.tracking.iter())
            .map(String::as_str)
            .collect();
        if elevated {
            entries.extend(
                self.premium
                    .trackers
                    .iter()
                    .chain(self.premium.analytics.iter())
                    .map(String::as_str),
            );
        }
        entries
    }
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<CategoryFeed>;
}

/// Fetches the feed over HTTPS, caching the parsed document for the
/// configured lifetime.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
    cache: Cache<String, Arc<CategoryFeed>>,
}

impl HttpFeedSource {
    pub fn new(url: String, cache_ttl: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(FEED_USER_AGENT)
            .timeout(FEED_TIMEOUT)
            .build()
            .unwrap();
        let cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(cache_ttl)
            .build();
        Self { client, url, cache }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<CategoryFeed> {
        let url = self.url.clone();
        let feed = self
            .cache
            .try_get_with(url.clone(), async {
                debug!("Fetching category feed from {url}");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?;
                let feed: CategoryFeed = response.json().await?;
                Ok::<_, reqwest::Error>(Arc::new(feed))
            })
            .await
            .map_err(|e| anyhow!("category feed fetch from {} failed: {e}", self.url))?;
        Ok((*feed).clone())
    }
}

/// Reads the feed from a bundled JSON file. Used by default so the agent
/// works offline.
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch(&self) -> Result<CategoryFeed> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read category feed {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed category feed {}", self.path.display()))
    }
}
