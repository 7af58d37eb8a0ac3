//! SQLite implementation of the KeyValueStore trait.
//!
//! This is the persistent backend for local state. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, KeyValueStore};

/// SQLite-based key-value store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.blocking(move |conn| {
            let removed = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn insert_all_if_absent(&self, entries: &[(String, String)]) -> Result<InsertResult> {
        let entries = entries.to_vec();
        self.blocking(move |conn| {
            // IMMEDIATE takes the write lock up front so a second process
            // cannot interleave between the existence check and the insert.
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

            for (key, _) in &entries {
                let exists: Option<i64> = tx
                    .query_row(
                        "SELECT 1 FROM kv_entries WHERE key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_some() {
                    return Ok(InsertResult::AlreadyExists);
                }
            }

            let now = now_millis();
            for (key, value) in &entries {
                tx.execute(
                    "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    params![key, value, now],
                )?;
            }

            tx.commit()?;
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv_entries WHERE key >= ?1 ORDER BY key")?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(keys
                .into_iter()
                .take_while(|k| k.starts_with(&prefix))
                .collect())
        })
        .await
    }
}
