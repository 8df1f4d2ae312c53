//! Common utilities shared across CLI commands

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cache::SnapshotStore;
use crate::config::Config;
use crate::scheduler::CommandKind;

/// Granularity of interruptible sleeps
const SLEEP_STEP: Duration = Duration::from_millis(200);

/// Set up a Ctrl+C handler and return the flag it sets.
///
/// Long-running commands poll the flag between steps so they can stop
/// cleanly instead of being killed mid-write.
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);

    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
    })
    .ok(); // Ignore error if handler already set

    interrupted
}

/// Check if the interrupt flag has been set.
pub fn is_interrupted(interrupted: &AtomicBool) -> bool {
    interrupted.load(Ordering::SeqCst)
}

/// Sleep for `total`, waking early if interrupted.
///
/// Returns `true` when the sleep was cut short.
pub fn sleep_unless_interrupted(total: Duration, interrupted: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if is_interrupted(interrupted) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(SLEEP_STEP.min(deadline - now));
    }
}

/// Snapshot store for the calling user
pub fn store_for(config: &Config, user: &str, kind: CommandKind) -> SnapshotStore {
    SnapshotStore::new(&config.cache_dir(), user, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_returns_immediately_when_interrupted() {
        let flag = AtomicBool::new(true);
        let start = Instant::now();
        assert!(sleep_unless_interrupted(Duration::from_secs(60), &flag));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_runs_to_completion() {
        let flag = AtomicBool::new(false);
        let start = Instant::now();
        assert!(!sleep_unless_interrupted(Duration::from_millis(50), &flag));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_store_for_uses_cache_dir() {
        let mut config = Config::default();
        config.cache.directory = Some("/scratch/cache".into());
        let store = store_for(&config, "alice", CommandKind::History);
        assert_eq!(
            store.snapshot_path(),
            std::path::PathBuf::from("/scratch/cache/schedcache-alice-bhist.snapshot")
        );
    }
}
