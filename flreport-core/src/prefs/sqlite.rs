//! SQLite-backed preference store
//!
//! Uses a single key/value table with embedded migrations managed via
//! PRAGMA user_version.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::{PrefStore, NO_SLOT_CHECKED};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: key/value preference table
    r#"
    CREATE TABLE IF NOT EXISTS prefs (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#,
];

const KEY_LAST_CHECKED_SLOT: &str = "last_checked_slot";
const KEY_COLLECTION_ID: &str = "collection_id";
const KEY_COLLECTION_ID_EXPIRATION: &str = "collection_id_expiration";

/// Durable preference store backed by SQLite.
///
/// The connection is serialized behind a mutex; every setter commits before
/// returning, so a value read back after a crash is always the last one a
/// setter reported as written.
pub struct SqlitePrefStore {
    conn: Mutex<Connection>,
}

impl SqlitePrefStore {
    /// Open (or create) a preference store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (used by tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let target = i as i32 + 1;
            if version < target {
                conn.execute_batch(migration)?;
                conn.pragma_update(None, "user_version", target)?;
            }
        }

        debug_assert_eq!(MIGRATIONS.len() as i32, SCHEMA_VERSION);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

impl PrefStore for SqlitePrefStore {
    fn last_checked_slot(&self) -> Result<i64> {
        match self.get(KEY_LAST_CHECKED_SLOT)? {
            Some(value) => value
                .parse()
                .map_err(|e| Error::Config(format!("corrupt last_checked_slot pref: {}", e))),
            None => Ok(NO_SLOT_CHECKED),
        }
    }

    fn set_last_checked_slot(&self, slot: i64) -> Result<()> {
        self.set(KEY_LAST_CHECKED_SLOT, &slot.to_string())
    }

    fn collection_id(&self) -> Result<String> {
        Ok(self.get(KEY_COLLECTION_ID)?.unwrap_or_default())
    }

    fn collection_id_expiration(&self) -> Result<Option<DateTime<Utc>>> {
        match self.get(KEY_COLLECTION_ID_EXPIRATION)? {
            Some(value) => {
                let parsed = DateTime::parse_from_rfc3339(&value).map_err(|e| {
                    Error::Config(format!("corrupt collection_id_expiration pref: {}", e))
                })?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }

    fn set_collection_id(&self, id: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        self.set(KEY_COLLECTION_ID, id)?;
        if let Some(expires_at) = expires_at {
            self.set(KEY_COLLECTION_ID_EXPIRATION, &expires_at.to_rfc3339())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_on_fresh_store() {
        let store = SqlitePrefStore::open_in_memory().unwrap();
        assert_eq!(store.last_checked_slot().unwrap(), NO_SLOT_CHECKED);
        assert_eq!(store.collection_id().unwrap(), "");
        assert!(store.collection_id_expiration().unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.db");
        let expires = Utc.with_ymd_and_hms(2021, 9, 2, 12, 30, 0).unwrap();

        {
            let store = SqlitePrefStore::open(&path).unwrap();
            store.set_last_checked_slot(42).unwrap();
            store
                .set_collection_id("DEADBEEF00112233", Some(expires))
                .unwrap();
        }

        let store = SqlitePrefStore::open(&path).unwrap();
        assert_eq!(store.last_checked_slot().unwrap(), 42);
        assert_eq!(store.collection_id().unwrap(), "DEADBEEF00112233");
        assert_eq!(store.collection_id_expiration().unwrap(), Some(expires));
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let store = SqlitePrefStore::open_in_memory().unwrap();
        store.set_last_checked_slot(1).unwrap();
        store.set_last_checked_slot(2).unwrap();
        assert_eq!(store.last_checked_slot().unwrap(), 2);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/prefs.db");
        let store = SqlitePrefStore::open(&path).unwrap();
        store.set_last_checked_slot(0).unwrap();
        assert!(path.exists());
    }
}
