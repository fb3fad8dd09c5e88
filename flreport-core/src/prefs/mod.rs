//! Persisted reporting state
//!
//! Three values survive restarts: the last successfully reported slot, the
//! current collection id, and the id's expiration. This module is the seam
//! to whatever preference storage the host provides; [`SqlitePrefStore`] is
//! the on-disk implementation, [`MemoryPrefStore`] backs tests and embedding
//! hosts that manage persistence themselves.

pub mod sqlite;

pub use sqlite::SqlitePrefStore;

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Sentinel for "no slot has ever been reported".
pub const NO_SLOT_CHECKED: i64 = -1;

/// Host preference storage for the reporting cursor.
///
/// Writes are synchronous: callers rely on the cursor being durable before
/// the next scheduler fire is processed.
pub trait PrefStore: Send + Sync {
    /// Last slot index for which an upload returned HTTP 200.
    ///
    /// Defaults to [`NO_SLOT_CHECKED`] when never written.
    fn last_checked_slot(&self) -> Result<i64>;

    fn set_last_checked_slot(&self, slot: i64) -> Result<()>;

    /// Current collection id; empty string when never written.
    fn collection_id(&self) -> Result<String>;

    /// Expiration of the current collection id, if one was recorded.
    fn collection_id_expiration(&self) -> Result<Option<DateTime<Utc>>>;

    /// Stores the collection id together with its expiration.
    fn set_collection_id(&self, id: &str, expires_at: Option<DateTime<Utc>>) -> Result<()>;
}

/// In-memory preference store.
#[derive(Debug, Default)]
pub struct MemoryPrefStore {
    inner: Mutex<MemoryPrefs>,
}

#[derive(Debug)]
struct MemoryPrefs {
    last_checked_slot: i64,
    collection_id: String,
    collection_id_expiration: Option<DateTime<Utc>>,
}

impl Default for MemoryPrefs {
    fn default() -> Self {
        Self {
            last_checked_slot: NO_SLOT_CHECKED,
            collection_id: String::new(),
            collection_id_expiration: None,
        }
    }
}

impl MemoryPrefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefStore for MemoryPrefStore {
    fn last_checked_slot(&self) -> Result<i64> {
        Ok(self.inner.lock().unwrap().last_checked_slot)
    }

    fn set_last_checked_slot(&self, slot: i64) -> Result<()> {
        self.inner.lock().unwrap().last_checked_slot = slot;
        Ok(())
    }

    fn collection_id(&self) -> Result<String> {
        Ok(self.inner.lock().unwrap().collection_id.clone())
    }

    fn collection_id_expiration(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.lock().unwrap().collection_id_expiration)
    }

    fn set_collection_id(&self, id: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.collection_id = id.to_string();
        inner.collection_id_expiration = expires_at;
        Ok(())
    }
}
