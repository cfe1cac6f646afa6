//! Access to the browser cookie jar.
//!
//! The sweep pipeline only ever talks to the [`CookieStore`] trait; backends
//! cover a real Firefox `cookies.sqlite` profile and an in-memory jar used
//! for tests and dry runs.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCookieStore;
pub use sqlite::SqliteCookieStore;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The `SameSite` attribute of a cookie, with unknown values mapped to the
/// most permissive level by the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    NoRestriction,
    Lax,
    Strict,
}

/// One cookie as seen by the classifier. `domain` keeps the raw stored form
/// (a leading dot marks a domain cookie); normalization happens at match
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub domain: String,
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
    pub host_only: bool,
    pub same_site: SameSite,
}

#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Lists every cookie in the jar, in the backend's stable order.
    async fn enumerate(&self) -> Result<Vec<CookieRecord>>;

    /// Removes one cookie addressed by origin URL and name. Removing a
    /// cookie that no longer exists is not an error.
    async fn remove(&self, url: &str, name: &str) -> Result<()>;
}

/// Splits a removal URL back into the host and path the jar is keyed by.
pub(crate) fn parse_removal_url(url: &str) -> Result<(String, String)> {
    let parsed = url::Url::parse(url).with_context(|| format!("bad removal url '{url}'"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("removal url '{url}' has no host"))?
        .to_lowercase();
    Ok((host, parsed.path().to_string()))
}
