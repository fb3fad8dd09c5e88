//! Upload attempt logic
//!
//! [`Reporter`] holds the reporting cursor and decides, on each timer fire,
//! whether the current slot still needs a report. At most one upload is ever
//! attempted per distinct slot index: a slot is marked checked only after an
//! HTTP 200, so a failed attempt is retried implicitly when the next slot
//! begins.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime, Utc};

use crate::collection_id::CollectionIdManager;
use crate::config::ReporterConfig;
use crate::error::Result;
use crate::platform::platform_identifier;
use crate::prefs::PrefStore;
use crate::slot::collection_slot;

use super::client::{CollectionReport, ReportTransport};

/// Outcome of a single upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Current slot equals the last successfully reported slot; nothing sent.
    SlotAlreadyReported,
    /// A request went out for `slot`; `accepted` is true only on HTTP 200.
    Sent { slot: i64, accepted: bool },
}

/// Owns the reporting cursor, the collection id, and the transport.
pub struct Reporter {
    config: ReporterConfig,
    prefs: Arc<dyn PrefStore>,
    transport: Arc<dyn ReportTransport>,
    platform: String,
    collection_id: CollectionIdManager,
    last_checked_slot: i64,
}

impl Reporter {
    /// Build a reporter, loading the persisted cursor from the store.
    pub fn new(
        config: ReporterConfig,
        prefs: Arc<dyn PrefStore>,
        transport: Arc<dyn ReportTransport>,
    ) -> Result<Self> {
        config.validate()?;

        let collection_id =
            CollectionIdManager::load(prefs.as_ref(), config.collection_id_lifetime_days)?;
        let last_checked_slot = prefs.last_checked_slot()?;
        let platform = config
            .platform
            .clone()
            .unwrap_or_else(|| platform_identifier().to_string());

        Ok(Self {
            config,
            prefs,
            transport,
            platform,
            collection_id,
            last_checked_slot,
        })
    }

    /// Attempt an upload for the current wall-clock slot.
    pub async fn attempt_upload(&mut self) -> Result<UploadOutcome> {
        self.attempt_upload_at(Local::now().naive_local(), Utc::now())
            .await
    }

    /// Attempt an upload for the slot containing `now_local`.
    ///
    /// Split out from [`attempt_upload`] so tests can drive the clock. The
    /// slot comparison is equality only: a backward clock move into an
    /// already-reported slot skips the report, and index aliasing after a
    /// month rollover can re-report, both inherited behaviors.
    pub async fn attempt_upload_at(
        &mut self,
        now_local: NaiveDateTime,
        now_utc: DateTime<Utc>,
    ) -> Result<UploadOutcome> {
        let slot = collection_slot(now_local, self.config.slot_size_minutes);
        if slot == self.last_checked_slot {
            return Ok(UploadOutcome::SlotAlreadyReported);
        }

        let collection_id = self
            .collection_id
            .ensure_fresh(now_utc, self.prefs.as_ref())?
            .to_string();

        let report = CollectionReport {
            collection_id,
            platform: self.platform.clone(),
            collection_slot: slot,
        };

        let status = self.transport.post_report(&report).await;
        let accepted = status == Some(200);

        if accepted {
            self.last_checked_slot = slot;
            self.prefs.set_last_checked_slot(slot)?;
            tracing::debug!(slot, "Collection slot reported");
        } else {
            // Fire and forget: no retry, the next slot is the retry.
            tracing::debug!(slot, status = ?status, "Collection slot report not accepted");
        }

        Ok(UploadOutcome::Sent { slot, accepted })
    }

    /// Last slot index acknowledged with HTTP 200.
    pub fn last_checked_slot(&self) -> i64 {
        self.last_checked_slot
    }
}
