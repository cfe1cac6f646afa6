use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::{parse_removal_url, CookieRecord, CookieStore};
use crate::engine::domain::normalize_cookie_domain;

/// In-memory cookie jar. Enumeration order is insertion order.
#[derive(Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<Vec<CookieRecord>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, cookie: CookieRecord) {
        self.cookies.write().unwrap().push(cookie);
    }

    pub fn len(&self) -> usize {
        self.cookies.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a cookie with this name is still present, under any domain.
    pub fn contains_name(&self, name: &str) -> bool {
        self.cookies.read().unwrap().iter().any(|c| c.name == name)
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn enumerate(&self) -> Result<Vec<CookieRecord>> {
        Ok(self.cookies.read().unwrap().clone())
    }

    async fn remove(&self, url: &str, name: &str) -> Result<()> {
        let (host, path) = parse_removal_url(url)?;
        self.cookies.write().unwrap().retain(|c| {
            !(c.name == name && c.path == path && normalize_cookie_domain(&c.domain) == host)
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SameSite;

    fn cookie(domain: &str, name: &str) -> CookieRecord {
        CookieRecord {
            domain: domain.to_string(),
            name: name.to_string(),
            value: "v".to_string(),
            path: "/".to_string(),
            secure: false,
            host_only: false,
            same_site: SameSite::NoRestriction,
        }
    }

    #[tokio::test]
    async fn test_remove_matches_dotted_domain() {
        let store = MemoryCookieStore::new();
        store.insert(cookie(".example.com", "tracker"));
        store.insert(cookie("example.com", "other"));

        store.remove("http://example.com/", "tracker").await.unwrap();

        let left = store.enumerate().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "other");
    }

    #[tokio::test]
    async fn test_remove_of_absent_cookie_is_ok() {
        let store = MemoryCookieStore::new();
        store.remove("http://example.com/", "ghost").await.unwrap();
        assert!(store.is_empty());
    }
}
