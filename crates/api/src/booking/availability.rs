//! Best-effort consumption of a tutor's weekly availability slot.

use chrono::FixedOffset;
use educonnect_core::slot::Slot;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::repositories::AvailabilityRepo;
use educonnect_db::DbPool;

/// Remove the tutor's availability row covering `starts_at`.
///
/// Deletes by the denormalised `slot_code` first and falls back to the
/// `(day, pod)` pair for rows written without one. Returns whether a row was
/// removed. Errors are logged and reported as `false`; a booking never fails
/// because its slot could not be consumed.
pub async fn consume(pool: &DbPool, tutor_id: DbId, starts_at: Timestamp, tz: &FixedOffset) -> bool {
    let slot = Slot::from_instant(&starts_at, tz);
    let slot_code = slot.code();

    match AvailabilityRepo::delete_by_slot_code(pool, tutor_id, &slot_code).await {
        Ok(n) if n > 0 => return true,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(tutor_id, slot = %slot_code, error = %e, "Availability delete by slot code failed");
        }
    }

    match AvailabilityRepo::delete_by_day_pod(pool, tutor_id, slot).await {
        Ok(n) if n > 0 => true,
        Ok(_) => {
            tracing::debug!(tutor_id, slot = %slot_code, "No availability row to consume");
            false
        }
        Err(e) => {
            tracing::warn!(tutor_id, slot = %slot_code, error = %e, "Availability delete by day/pod failed");
            false
        }
    }
}
