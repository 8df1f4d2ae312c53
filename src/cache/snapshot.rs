//! Per-user snapshot files
//!
//! A snapshot is the complete stdout of `<command> -a`, stored verbatim.
//! Its modification time is the freshness clock. Writers never touch the live
//! file: they fill a temporary file in the same directory and rename it over
//! the snapshot, so a reader always opens either the old or the new listing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::lock::RefreshLock;
use super::policy;
use crate::error::RefreshFailure;
use crate::scheduler::CommandKind;

/// Handle on the snapshot and lock files of one (user, command) pair
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    kind: CommandKind,
    dir: PathBuf,
    stem: String,
}

impl SnapshotStore {
    /// Create a store for `user` and `kind` inside `cache_dir`
    pub fn new(cache_dir: &Path, user: &str, kind: CommandKind) -> Self {
        Self {
            kind,
            dir: cache_dir.to_path_buf(),
            stem: format!("schedcache-{}-{}", user, kind.program_name()),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Live snapshot path
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.snapshot", self.stem))
    }

    /// Lock file guarding refreshes
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(format!("{}.lock", self.stem))
    }

    /// Last write time of the snapshot, `None` when there is no snapshot
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(self.snapshot_path())
            .and_then(|m| m.modified())
            .ok()
    }

    /// Read the current snapshot
    pub fn read(&self) -> io::Result<Snapshot> {
        let text = fs::read_to_string(self.snapshot_path())?;
        Ok(Snapshot::new(self.kind, text))
    }

    /// Take the refresh lock without waiting
    pub fn try_lock(&self) -> Result<RefreshLock, RefreshFailure> {
        fs::create_dir_all(&self.dir)?;
        RefreshLock::try_acquire(&self.lock_path())
    }

    /// Fresh temporary file next to the snapshot, removed again on drop
    pub(crate) fn temp_file(&self) -> io::Result<NamedTempFile> {
        fs::create_dir_all(&self.dir)?;
        tempfile::Builder::new()
            .prefix(&format!(".{}.", self.stem))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
    }

    /// Atomically replace the snapshot with `temp`
    pub(crate) fn install(&self, temp: NamedTempFile) -> io::Result<()> {
        temp.persist(self.snapshot_path())
            .map(|_| ())
            .map_err(|e| e.error)
    }

    /// Delete the snapshot; returns whether one existed
    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_file(self.snapshot_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Describe the snapshot for `cache status`
    pub fn status(&self, lifetime: Duration) -> SnapshotStatus {
        let path = self.snapshot_path();
        let modified = self.modified();
        let now = SystemTime::now();

        let age_secs = modified.map(|m| {
            now.duration_since(m)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
        let snapshot = modified.and_then(|_| self.read().ok());

        SnapshotStatus {
            command: self.kind.program_name(),
            path,
            lock_path: self.lock_path(),
            exists: modified.is_some(),
            age_secs,
            fresh: !policy::is_expired(modified, lifetime, now),
            rows: snapshot.as_ref().map(Snapshot::row_count),
            max_job_id: snapshot.as_ref().and_then(Snapshot::max_job_id),
        }
    }
}

/// Status of a single snapshot file
#[derive(Debug, Serialize)]
pub struct SnapshotStatus {
    pub command: &'static str,
    pub path: PathBuf,
    pub lock_path: PathBuf,
    pub exists: bool,
    pub age_secs: Option<u64>,
    pub fresh: bool,
    pub rows: Option<usize>,
    pub max_job_id: Option<u64>,
}

/// Contents of a snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    kind: CommandKind,
    text: String,
}

impl Snapshot {
    pub fn new(kind: CommandKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Header lines, at most `kind.header_lines()` of them
    pub fn header(&self) -> impl Iterator<Item = &str> {
        self.text.lines().take(self.kind.header_lines())
    }

    /// Every line after the header
    pub fn data_lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().skip(self.kind.header_lines())
    }

    /// Job ids of all data rows whose first field is numeric
    pub fn job_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.data_lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter_map(|field| field.parse().ok())
    }

    pub fn max_job_id(&self) -> Option<u64> {
        self.job_ids().max()
    }

    pub fn row_count(&self) -> usize {
        self.job_ids().count()
    }
}
