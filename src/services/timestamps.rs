//! Timestamp generation at database precision.
//!
//! PostgreSQL `timestamptz` keeps microseconds, so every timestamp the
//! ledger compares or persists is truncated to microseconds first.

use chrono::{Duration, SubsecRound, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

/// Current UTC time truncated to microseconds
pub fn now() -> DateTimeWithTimeZone {
    Utc::now().trunc_subsecs(6).fixed_offset()
}

/// Truncates a caller-supplied timestamp to microseconds.
pub fn normalize(ts: DateTimeWithTimeZone) -> DateTimeWithTimeZone {
    ts.trunc_subsecs(6)
}

/// Returns a timestamp strictly after `previous` and no earlier than `candidate`.
pub fn strictly_after(
    candidate: DateTimeWithTimeZone,
    previous: Option<DateTimeWithTimeZone>,
) -> DateTimeWithTimeZone {
    let candidate = normalize(candidate);
    match previous {
        Some(prev) if candidate <= prev => normalize(prev) + Duration::microseconds(1),
        _ => candidate,
    }
}
