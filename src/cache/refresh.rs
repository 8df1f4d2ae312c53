//! Regenerating a snapshot from the real command

use super::snapshot::SnapshotStore;
use crate::error::RefreshFailure;
use crate::scheduler::Scheduler;

/// Replace the snapshot with a new full listing
///
/// Takes the store's lock without waiting and gives up with
/// [`RefreshFailure::LockContention`] if another process holds it. The listing
/// is written to a temporary file and only renamed over the snapshot when the
/// command exits 0 with some output; otherwise the old snapshot stays as is.
/// Returns the size of the installed snapshot in bytes.
pub fn refresh<S>(
    store: &SnapshotStore,
    scheduler: &S,
    extra_args: &[String],
) -> Result<u64, RefreshFailure>
where
    S: Scheduler + ?Sized,
{
    let _lock = store.try_lock()?;

    let temp = store.temp_file()?;
    let sink = temp.reopen()?;

    let kind = store.kind();
    let exit_code = scheduler
        .list_all(kind, extra_args, sink)
        .map_err(|e| RefreshFailure::CommandFailed(e.to_string()))?;
    if exit_code != 0 {
        return Err(RefreshFailure::CommandFailed(format!(
            "{} -a exited with status {}",
            kind, exit_code
        )));
    }

    let size = temp.as_file().metadata()?.len();
    if size == 0 {
        return Err(RefreshFailure::CommandFailed(format!(
            "{} -a printed nothing",
            kind
        )));
    }

    store.install(temp)?;
    Ok(size)
}
