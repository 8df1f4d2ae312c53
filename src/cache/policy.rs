//! Freshness and overflow decisions

use std::time::{Duration, SystemTime};

use super::snapshot::Snapshot;

/// Whether a snapshot last written at `modified` must be refreshed at `now`
///
/// A missing snapshot is always expired. A timestamp in the future counts as
/// age zero.
pub fn is_expired(modified: Option<SystemTime>, lifetime: Duration, now: SystemTime) -> bool {
    match modified {
        None => true,
        Some(modified) => {
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            age >= lifetime
        }
    }
}

/// Whether `job_id` is newer than every job in the snapshot
///
/// Only meaningful after a miss. A snapshot without numeric rows overflows
/// for every id.
pub fn is_overflow(snapshot: &Snapshot, job_id: u64) -> bool {
    match snapshot.max_job_id() {
        Some(max) => job_id > max,
        None => true,
    }
}
