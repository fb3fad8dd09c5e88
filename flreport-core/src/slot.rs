//! Collection slot arithmetic
//!
//! A slot is a fixed-width window of local wall-clock time. The index counts
//! whole windows since local midnight on the first of the month, so it grows
//! monotonically across a calendar month and resets (aliases) at the month
//! boundary. Slots are compared by equality only; see
//! [`crate::reporter::Reporter`] for the de-duplication contract.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Computes the slot index for a local wall-clock time.
///
/// `slot_size_minutes` must be validated as nonzero by the caller
/// (see `ReporterConfig::validate`).
pub fn collection_slot(now: NaiveDateTime, slot_size_minutes: u32) -> i64 {
    let minutes_of_month = (now.day() - 1) * 24 * 60 + now.hour() * 60 + now.minute();
    i64::from(minutes_of_month / slot_size_minutes)
}
