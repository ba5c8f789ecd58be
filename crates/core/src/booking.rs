//! Booking rules: match state machine and session scheduling.
//!
//! Pure decision functions used by the booking handlers. The datastore still
//! has the final word on every transition through guarded updates; these
//! functions only decide what to attempt given an observed status.

use chrono::{Duration, TimeZone};

use crate::error::CoreError;
use crate::slot::Slot;
use crate::status::MatchStatus;
use crate::types::{DbId, Timestamp};

/// Longest bookable session in minutes.
pub const MAX_SESSION_DURATION_MIN: i64 = 480;

/// Default session length when the caller does not give one.
pub const DEFAULT_SESSION_DURATION_MIN: i64 = 60;

/// Default delay between "now" and the start of an unscheduled session.
pub const DEFAULT_START_OFFSET_MIN: i64 = 60;

/// Fixed length of a direct reservation.
pub const RESERVATION_DURATION_MIN: i64 = 120;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns `true` if a match may move from `from` to `to`.
///
/// Only `proposed` has outgoing edges; every other state is terminal.
pub fn can_transition(from: MatchStatus, to: MatchStatus) -> bool {
    matches!(
        (from, to),
        (
            MatchStatus::Proposed,
            MatchStatus::Accepted | MatchStatus::Declined | MatchStatus::Expired
        )
    )
}

/// What an accept request should do given the match's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptPlan {
    /// Attempt the guarded `proposed -> accepted` update.
    Transition,
    /// The match is already accepted; reuse or create its session.
    AlreadyAccepted,
}

pub fn plan_accept(status: MatchStatus) -> Result<AcceptPlan, CoreError> {
    if can_transition(status, MatchStatus::Accepted) {
        Ok(AcceptPlan::Transition)
    } else if status == MatchStatus::Accepted {
        Ok(AcceptPlan::AlreadyAccepted)
    } else {
        Err(CoreError::InvalidState(format!(
            "Match is {status} and can no longer be accepted"
        )))
    }
}

/// Classify the status re-read after a guarded accept touched zero rows.
///
/// A concurrent accept is reported as [`AcceptPlan::AlreadyAccepted`];
/// anything else means another actor decided the match differently.
pub fn resolve_lost_accept(status: MatchStatus) -> Result<AcceptPlan, CoreError> {
    match status {
        MatchStatus::Accepted => Ok(AcceptPlan::AlreadyAccepted),
        other => Err(CoreError::InvalidState(format!(
            "Match changed to {other} while accepting"
        ))),
    }
}

/// What a decline request should do given the match's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclinePlan {
    Transition,
    AlreadyDeclined,
}

pub fn plan_decline(status: MatchStatus) -> Result<DeclinePlan, CoreError> {
    if can_transition(status, MatchStatus::Declined) {
        Ok(DeclinePlan::Transition)
    } else if status == MatchStatus::Declined {
        Ok(DeclinePlan::AlreadyDeclined)
    } else {
        Err(CoreError::InvalidState(format!(
            "Match is {status} and can no longer be declined"
        )))
    }
}

// ---------------------------------------------------------------------------
// Session bounds
// ---------------------------------------------------------------------------

/// Defaults applied when resolving a session's time window.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub default_start_offset_min: i64,
    pub default_duration_min: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            default_start_offset_min: DEFAULT_START_OFFSET_MIN,
            default_duration_min: DEFAULT_SESSION_DURATION_MIN,
        }
    }
}

/// Resolved start/end of a session plus the slot it falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBounds {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub slot: Slot,
}

impl SessionBounds {
    pub fn duration_min(&self) -> i64 {
        (self.ends_at - self.starts_at).num_minutes()
    }
}

/// Check a caller-supplied duration against `1..=MAX_SESSION_DURATION_MIN`.
pub fn validate_duration(duration_min: i64) -> Result<(), CoreError> {
    if !(1..=MAX_SESSION_DURATION_MIN).contains(&duration_min) {
        return Err(CoreError::Validation(format!(
            "Duration must be between 1 and {MAX_SESSION_DURATION_MIN} minutes, got {duration_min}"
        )));
    }
    Ok(())
}

/// Resolve the session window from optional caller input.
///
/// `starts_at` defaults to `now + policy.default_start_offset_min` and the
/// duration to `policy.default_duration_min`. The slot is read on the wall
/// clock of `tz`.
pub fn resolve_bounds<Tz: TimeZone>(
    starts_at: Option<Timestamp>,
    duration_min: Option<i64>,
    now: Timestamp,
    policy: &BookingPolicy,
    tz: &Tz,
) -> Result<SessionBounds, CoreError> {
    let duration_min = duration_min.unwrap_or(policy.default_duration_min);
    validate_duration(duration_min)?;

    let starts_at =
        starts_at.unwrap_or_else(|| now + Duration::minutes(policy.default_start_offset_min));

    Ok(SessionBounds {
        starts_at,
        ends_at: starts_at + Duration::minutes(duration_min),
        slot: Slot::from_instant(&starts_at, tz),
    })
}

/// Move a session to a new start while keeping its length.
pub fn reschedule<Tz: TimeZone>(
    current: (Timestamp, Timestamp),
    new_start: Timestamp,
    tz: &Tz,
) -> SessionBounds {
    let (starts_at, ends_at) = current;
    let length = ends_at - starts_at;
    SessionBounds {
        starts_at: new_start,
        ends_at: new_start + length,
        slot: Slot::from_instant(&new_start, tz),
    }
}

// ---------------------------------------------------------------------------
// Meeting room
// ---------------------------------------------------------------------------

/// Build a meeting room URL unique to a match.
///
/// Format: `{base}/edu-{match_id}-{base36 millis}`.
pub fn meeting_link(base_url: &str, match_id: DbId, now: Timestamp) -> String {
    let base = base_url.trim_end_matches('/');
    format!(
        "{base}/edu-{match_id}-{}",
        to_base36(now.timestamp_millis().unsigned_abs())
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}
