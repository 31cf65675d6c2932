use crate::cache::PersistentTier;
use crate::model::{CacheEntry, StorageError};
use crate::utils::parse_sqlite_datetime;

use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;
use tracing::debug;

/// Persistent report store. Rows never expire; a flush deletes them.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens the database file and creates the table if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS report_cache (
                cache_key TEXT PRIMARY KEY,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts or replaces a report. `created_at` survives an overwrite.
    pub async fn upsert(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO report_cache (cache_key, result, created_at, updated_at)
             VALUES (?1, ?2, datetime('now'), datetime('now'))
             ON CONFLICT(cache_key) DO UPDATE SET
                result = excluded.result,
                updated_at = datetime('now')",
            params![key, payload],
        )?;
        debug!("Stored report under {}", key);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM report_cache WHERE cache_key = ?1", params![key])?;
        Ok(())
    }

    /// Stored row with parsed timestamps.
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StorageError> {
        let row: Option<(String, String, String)> = {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT result, created_at, updated_at FROM report_cache WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
        };

        match row {
            Some((payload, created_at, updated_at)) => Ok(Some(CacheEntry {
                key: key.to_string(),
                payload,
                created_at: parse_sqlite_datetime(&created_at)?,
                updated_at: parse_sqlite_datetime(&updated_at)?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl PersistentTier for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StorageError> {
        SqliteStorage::get(self, key).await
    }

    async fn upsert(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        SqliteStorage::upsert(self, key, payload).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        SqliteStorage::delete(self, key).await
    }
}
