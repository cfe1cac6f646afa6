//! Initialization helpers for the application startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::engine::feed::{FeedSource, FileFeedSource, HttpFeedSource};
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::store::{CookieStore, MemoryCookieStore, SqliteCookieStore};

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress HTTP client internals unless explicitly overridden
        if !filter.contains("hyper") {
            filter.push_str(",hyper=warn");
        }
        if !filter.contains("reqwest") {
            filter.push_str(",reqwest=warn");
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Opens the configured state store.
pub fn init_state_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage.backend.as_str() {
        "sqlite" => {
            info!("Persisting state to {}", config.storage.path);
            Ok(Arc::new(SqliteStore::open(&config.storage.path)?))
        }
        "memory" => {
            info!("Using in-memory state store; nothing will survive restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => bail!("unknown storage backend '{other}' (expected sqlite or memory)"),
    }
}

/// Opens the configured cookie jar.
pub fn init_cookie_store(config: &Config) -> Result<Arc<dyn CookieStore>> {
    match config.cookies.backend.as_str() {
        "sqlite" => {
            let Some(path) = config.cookies.db_path.as_deref() else {
                bail!("cookies.db_path is required for the sqlite cookie backend");
            };
            info!("Sweeping cookie database at {}", path);
            Ok(Arc::new(SqliteCookieStore::open(path)?))
        }
        "memory" => {
            info!("Using in-memory cookie jar");
            Ok(Arc::new(MemoryCookieStore::new()))
        }
        other => bail!("unknown cookie backend '{other}' (expected sqlite or memory)"),
    }
}

/// Builds the category feed source.
pub fn init_feed_source(config: &Config) -> Result<Arc<dyn FeedSource>> {
    match config.feed.source.as_str() {
        "file" => Ok(Arc::new(FileFeedSource::new(config.feed.path.clone()))),
        "http" => {
            let Some(url) = config.feed.url.clone() else {
                bail!("feed.url is required when feed.source is http");
            };
            let ttl = Duration::from_secs(config.feed.cache_minutes * 60);
            Ok(Arc::new(HttpFeedSource::new(url, ttl)))
        }
        other => bail!("unknown feed source '{other}' (expected file or http)"),
    }
}
