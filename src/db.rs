use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// A cached API response body and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPage {
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < max_age
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create cache directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS page_cache (
                request_key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn store_page(&self, key: &str, body: &str, fetched_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO page_cache (request_key, body, fetched_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(request_key) DO UPDATE SET
                body = excluded.body,
                fetched_at = excluded.fetched_at
            "#,
            params![key, body, fetched_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn cached_page(&self, key: &str) -> Result<Option<CachedPage>> {
        let row = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM page_cache WHERE request_key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((body, fetched_at)) = row else {
            return Ok(None);
        };
        // An unreadable timestamp just makes the entry stale.
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Ok(Some(CachedPage { body, fetched_at }))
    }

    pub fn clear_pages(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM page_cache", [])?;
        Ok(removed)
    }
}
