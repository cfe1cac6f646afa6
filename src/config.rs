use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cookies: CookieJarConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub clean: CleanConfig,

    #[serde(default)]
    pub optout: OptOutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// `sqlite` or `memory`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieJarConfig {
    /// `sqlite` reads a Firefox `cookies.sqlite`; `memory` starts empty.
    #[serde(default = "default_cookie_backend")]
    pub backend: String,
    /// Required for the sqlite backend, e.g. a profile's cookies.sqlite.
    #[serde(default)]
    pub db_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// `file` or `http`.
    #[serde(default = "default_feed_source")]
    pub source: String,
    #[serde(default = "default_feed_path")]
    pub path: String,
    /// Required when `source = "http"`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_feed_cache_minutes")]
    pub cache_minutes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleanConfig {
    #[serde(default = "default_clean_interval")]
    pub interval_minutes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptOutConfig {
    #[serde(default = "default_vendors_path")]
    pub vendors_path: String,
    #[serde(default = "default_selectors_path")]
    pub selectors_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Defaults
fn default_api_port() -> u16 {
    8790
}
fn default_storage_backend() -> String {
    "sqlite".to_string()
}
fn default_storage_path() -> String {
    "crumbsweep.db".to_string()
}
fn default_cookie_backend() -> String {
    "memory".to_string()
}
fn default_feed_source() -> String {
    "file".to_string()
}
fn default_feed_path() -> String {
    "config/cookie-categories.json".to_string()
}
fn default_feed_cache_minutes() -> u64 {
    60
}
fn default_clean_interval() -> u64 {
    30
}
fn default_vendors_path() -> String {
    "config/iab-vendors.json".to_string()
}
fn default_selectors_path() -> String {
    "config/cmp-selectors.json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            storage: StorageConfig::default(),
            cookies: CookieJarConfig::default(),
            feed: FeedConfig::default(),
            clean: CleanConfig::default(),
            optout: OptOutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for CookieJarConfig {
    fn default() -> Self {
        Self {
            backend: default_cookie_backend(),
            db_path: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: default_feed_source(),
            path: default_feed_path(),
            url: None,
            cache_minutes: default_feed_cache_minutes(),
        }
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_clean_interval(),
        }
    }
}

impl Default for OptOutConfig {
    fn default() -> Self {
        Self {
            vendors_path: default_vendors_path(),
            selectors_path: default_selectors_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api_port, 8790);
        assert_eq!(config.storage.backend, "sqlite");
        assert_eq!(config.cookies.backend, "memory");
        assert_eq!(config.clean.interval_minutes, 30);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            "[cookies]\nbackend = \"sqlite\"\ndb_path = \"/tmp/cookies.sqlite\"\n",
        )
        .unwrap();
        assert_eq!(config.cookies.backend, "sqlite");
        assert_eq!(config.cookies.db_path.as_deref(), Some("/tmp/cookies.sqlite"));
        assert_eq!(config.feed.source, "file");
    }
}
