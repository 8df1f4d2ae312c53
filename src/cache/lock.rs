//! Non-blocking refresh lock

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;

use crate::error::RefreshFailure;

/// Exclusive hold on a snapshot's lock file, released on drop
#[derive(Debug)]
pub struct RefreshLock {
    file: File,
}

impl RefreshLock {
    /// Try once to take the lock at `path`; never waits
    pub fn try_acquire(path: &Path) -> Result<Self, RefreshFailure> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self { file }),
            Err(err) if is_contended(&err) => Err(RefreshFailure::LockContention),
            Err(err) => Err(RefreshFailure::Io(err)),
        }
    }
}

impl Drop for RefreshLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
