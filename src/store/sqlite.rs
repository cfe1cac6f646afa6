use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};

use super::{parse_removal_url, CookieRecord, CookieStore, SameSite};

/// Cookie jar backed by a Firefox `cookies.sqlite` profile database.
///
/// The database belongs to the browser, so this backend only reads and
/// deletes rows; it never alters the schema or journal mode. Run against a
/// profile copy, or a closed browser, to avoid lock contention.
pub struct SqliteCookieStore {
    conn: Mutex<Connection>,
}

impl SqliteCookieStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cookie database at {path}"))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// `moz_cookies.sameSite`: 0 none, 1 lax, 2 strict. Anything else is
/// treated as unrestricted.
fn same_site_from_db(value: i64) -> SameSite {
    match value {
        1 => SameSite::Lax,
        2 => SameSite::Strict,
        _ => SameSite::NoRestriction,
    }
}

#[async_trait]
impl CookieStore for SqliteCookieStore {
    async fn enumerate(&self) -> Result<Vec<CookieRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare_cached(
                "SELECT host, name, value, path, isSecure, sameSite
                 FROM moz_cookies ORDER BY id",
            )
            .context("failed to query moz_cookies")?;

        let rows = stmt.query_map([], |row| {
            let host: String = row.get(0)?;
            // A host without a leading dot was set without a Domain
            // attribute, i.e. host-only.
            let host_only = !host.starts_with('.');
            Ok(CookieRecord {
                domain: host,
                name: row.get(1)?,
                value: row.get(2)?,
                path: row.get(3)?,
                secure: row.get::<_, i64>(4)? != 0,
                host_only,
                same_site: same_site_from_db(row.get(5)?),
            })
        })?;

        let mut cookies = Vec::new();
        for row in rows {
            cookies.push(row?);
        }
        Ok(cookies)
    }

    async fn remove(&self, url: &str, name: &str) -> Result<()> {
        let (host, path) = parse_removal_url(url)?;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "DELETE FROM moz_cookies
             WHERE name = ?1 AND path = ?2 AND (host = ?3 OR host = '.' || ?3)",
        )?;
        stmt.execute(params![name, path, host])?;
        Ok(())
    }
}
