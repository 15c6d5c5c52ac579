use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::rail::cache::{CacheError, PolylineStore};

/// Settings key under which the polyline record is kept.
pub const RAIL_CACHE_KEY: &str = "rail_geometry_cache";

/// Polyline record stored as one row of a `settings(key, value)` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening rail cache database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            key: RAIL_CACHE_KEY.to_string(),
        })
    }

    /// Use a different settings key, e.g. to keep several caches in one file.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl PolylineStore for SqliteStore {
    fn read(&self) -> Result<Option<String>, CacheError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![self.key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, record: &str) -> Result<(), CacheError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![self.key, record],
        )?;
        Ok(())
    }
}
