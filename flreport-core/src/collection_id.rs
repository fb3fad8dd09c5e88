//! Collection id lifecycle
//!
//! The collection id is an anonymous rotating token included in every
//! report. Within its lifetime window reports are linkable to each other but
//! not to reports sent under earlier or later ids. Rotation happens lazily:
//! whenever the id is missing or its expiration has passed at the moment a
//! report is about to be built.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::prefs::PrefStore;

/// Owns the persisted collection id and its expiration.
pub struct CollectionIdManager {
    id: String,
    expires_at: Option<DateTime<Utc>>,
    lifetime_days: u32,
}

impl CollectionIdManager {
    /// Load the stored id and expiration from the preference store.
    pub fn load(prefs: &dyn PrefStore, lifetime_days: u32) -> Result<Self> {
        Ok(Self {
            id: prefs.collection_id()?,
            expires_at: prefs.collection_id_expiration()?,
            lifetime_days,
        })
    }

    /// Returns a non-expired collection id, rotating and persisting a new
    /// one when the stored id is empty or past its expiration.
    ///
    /// An absent expiration never forces rotation on its own; only an empty
    /// id or `now > expiration` does.
    pub fn ensure_fresh(&mut self, now: DateTime<Utc>, prefs: &dyn PrefStore) -> Result<&str> {
        let expired = matches!(self.expires_at, Some(expires_at) if now > expires_at);
        if self.id.is_empty() || expired {
            self.id = generate_collection_id();
            self.expires_at = Some(now + Duration::days(i64::from(self.lifetime_days)));
            prefs.set_collection_id(&self.id, self.expires_at)?;
            tracing::info!(expires_at = ?self.expires_at, "Rotated collection id");
        }
        Ok(&self.id)
    }

    /// Current id; empty until the first `ensure_fresh` call.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// A fresh random 128-bit token, rendered as 32 upper-case hex characters.
fn generate_collection_id() -> String {
    Uuid::new_v4().simple().to_string().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPrefStore;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 9, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_generates_id_on_first_use() {
        let prefs = MemoryPrefStore::new();
        let mut manager = CollectionIdManager::load(&prefs, 1).unwrap();
        assert_eq!(manager.id(), "");

        let id = manager.ensure_fresh(at(1, 0), &prefs).unwrap().to_string();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_ascii_uppercase());

        // Persisted synchronously, with expiration = now + lifetime.
        assert_eq!(prefs.collection_id().unwrap(), id);
        assert_eq!(
            prefs.collection_id_expiration().unwrap(),
            Some(at(1, 0) + Duration::days(1))
        );
    }

    #[test]
    fn test_stable_while_unexpired() {
        let prefs = MemoryPrefStore::new();
        let mut manager = CollectionIdManager::load(&prefs, 1).unwrap();

        let first = manager.ensure_fresh(at(1, 0), &prefs).unwrap().to_string();
        // Mark the store so an unexpected write would be visible.
        prefs.set_last_checked_slot(99).unwrap();

        let second = manager.ensure_fresh(at(1, 12), &prefs).unwrap().to_string();
        assert_eq!(first, second);
        assert_eq!(prefs.collection_id().unwrap(), first);
    }

    #[test]
    fn test_rotates_after_expiration() {
        let prefs = MemoryPrefStore::new();
        let mut manager = CollectionIdManager::load(&prefs, 1).unwrap();

        let stale = manager.ensure_fresh(at(1, 0), &prefs).unwrap().to_string();
        let fresh = manager.ensure_fresh(at(3, 0), &prefs).unwrap().to_string();

        assert_ne!(stale, fresh);
        assert_eq!(
            manager.expires_at(),
            Some(at(3, 0) + Duration::days(1)),
            "expiration re-anchored at rotation time"
        );
    }

    #[test]
    fn test_exact_expiration_instant_does_not_rotate() {
        let prefs = MemoryPrefStore::new();
        let mut manager = CollectionIdManager::load(&prefs, 1).unwrap();

        let id = manager.ensure_fresh(at(1, 0), &prefs).unwrap().to_string();
        let expires_at = manager.expires_at().unwrap();

        // Rotation requires now strictly greater than the expiration.
        let same = manager.ensure_fresh(expires_at, &prefs).unwrap().to_string();
        assert_eq!(id, same);
    }

    #[test]
    fn test_missing_expiration_with_stored_id_is_kept() {
        let prefs = MemoryPrefStore::new();
        prefs.set_collection_id("CAFEBABE", None).unwrap();

        let mut manager = CollectionIdManager::load(&prefs, 1).unwrap();
        let id = manager.ensure_fresh(at(1, 0), &prefs).unwrap();
        assert_eq!(id, "CAFEBABE");
    }
}
