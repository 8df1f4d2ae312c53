//! Snapshot cache for single-job scheduler queries
//!
//! Holds one full listing per (user, command) in the cache directory and
//! answers single-job lookups from it.

mod lock;
pub mod policy;
mod refresh;
mod resolve;
mod snapshot;

pub use lock::RefreshLock;
pub use policy::{is_expired, is_overflow};
pub use refresh::refresh;
pub use resolve::resolve;
pub use snapshot::{Snapshot, SnapshotStatus, SnapshotStore};

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::scheduler::CommandKind;

/// Remove every snapshot belonging to `user`; returns how many were removed
pub fn clear_all(cache_dir: &Path, user: &str) -> Result<usize> {
    let mut removed = 0;
    for kind in CommandKind::ALL {
        if SnapshotStore::new(cache_dir, user, kind).clear()? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Get cache status information
pub fn status(cache_dir: &Path, user: &str, lifetime: Duration) -> CacheStatus {
    let snapshots = CommandKind::ALL
        .iter()
        .map(|&kind| SnapshotStore::new(cache_dir, user, kind).status(lifetime))
        .collect();

    CacheStatus {
        lifetime_secs: lifetime.as_secs(),
        snapshots,
    }
}

/// Overall cache status
#[derive(Debug, serde::Serialize)]
pub struct CacheStatus {
    pub lifetime_secs: u64,
    pub snapshots: Vec<SnapshotStatus>,
}
