use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::cache::KeyValueStore;
use crate::error::{ClientError, Result};

/// Durable store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_entries: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

/// SQLite-backed key/value store, the durable tier
///
/// ```sql
/// CREATE TABLE kv_store (
///     key TEXT PRIMARY KEY,
///     value TEXT NOT NULL,
///     updated_at TIMESTAMP
/// );
/// ```
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path`; `:memory:` for a scratch store
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_updated_at ON kv_store(updated_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ClientError::Cache("sqlite connection lock poisoned".to_string()))
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;

        let total_entries: u64 = conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;

        let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(updated_at), MAX(updated_at) FROM kv_store",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            total_entries,
            oldest_entry: oldest.as_deref().and_then(parse_timestamp),
            newest_entry: newest.as_deref().and_then(parse_timestamp),
        })
    }

    /// Delete entries not written in the last `max_age_days`
    pub async fn cleanup(&self, max_age_days: i64) -> Result<u64> {
        let conn = self.conn()?;

        let cutoff_date = Utc::now() - chrono::Duration::days(max_age_days);

        let deleted = conn.execute(
            "DELETE FROM kv_store WHERE updated_at < ?",
            params![cutoff_date.to_rfc3339()],
        )?;

        Ok(deleted as u64)
    }
}

/// RFC 3339 as written by this store, or SQLite's `CURRENT_TIMESTAMP` form
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, json, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
        Ok(deleted > 0)
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM kv_store WHERE substr(key, 1, ?2) = ?1",
            params![prefix, prefix.chars().count() as i64],
        )?;
        Ok(deleted as u64)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv_store", [])?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
