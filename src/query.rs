//! Answering one emulated `bjobs`/`bhist` invocation
//!
//! [`QueryEngine::run`] walks a single query to exactly one [`Outcome`]:
//!
//! 1. Anything but a single canonical job id falls back to the real command.
//! 2. An expired snapshot is refreshed first; if refreshing is disabled or
//!    fails, the query falls back.
//! 3. The snapshot is searched. A hit is answered from it.
//! 4. A miss for an id newer than every cached job forces one more refresh
//!    and one more search.
//! 5. Anything still missing gets the real command's not-found answer.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::time::{Duration, SystemTime};

use crate::audit::{AuditEvent, AuditLog, Decision};
use crate::cache::{self, SnapshotStore};
use crate::config::Config;
use crate::error::RefreshFailure;
use crate::scheduler::{CommandKind, NotFound, Scheduler};

/// Terminal result of a query
#[derive(Debug)]
pub enum Outcome {
    /// Rendered answer, printed to stdout with exit status 0
    Hit(String),
    /// The job is absent and the snapshot is recent enough to say so
    NotFound(NotFound),
    /// Hand the invocation to the real command unchanged
    Fallback(Delegation),
}

/// Instructions for running the real command in place of the cache
#[derive(Debug)]
pub struct Delegation {
    pub command: CommandKind,
    /// The caller's original arguments
    pub args: Vec<OsString>,
    pub reason: FallbackReason,
}

/// Why a query could not be answered from the cache
#[derive(Debug)]
pub enum FallbackReason {
    /// Not exactly one canonical job id
    UnsupportedArguments,
    /// Refresh needed but `cache.maintain` is off
    RefreshDisabled,
    Refresh(RefreshFailure),
    SnapshotUnreadable(io::Error),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedArguments => f.write_str("arguments are not a single job id"),
            Self::RefreshDisabled => f.write_str("snapshot needs a refresh but maintenance is off"),
            Self::Refresh(failure) => write!(f, "refresh failed: {}", failure),
            Self::SnapshotUnreadable(err) => write!(f, "snapshot unreadable: {}", err),
        }
    }
}

/// Cache behaviour taken from the configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub lifetime: Duration,
    pub maintain: bool,
    pub extra_args: Vec<String>,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            lifetime: config.lifetime(),
            maintain: config.cache.maintain,
            extra_args: config.cache.extra_args.clone(),
        }
    }
}

/// Parse the job id out of an invocation's arguments
///
/// Only a single argument made of ASCII digits, without a leading zero
/// (except `0` itself), that fits in a `u64` qualifies. Ids like `007` or
/// `1234[5]` are left to the real command.
pub fn parse_job_id(args: &[OsString]) -> Option<u64> {
    let [arg] = args else {
        return None;
    };
    let arg = arg.to_str()?;

    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if arg.len() > 1 && arg.starts_with('0') {
        return None;
    }
    arg.parse().ok()
}

/// Runs queries against one snapshot store
pub struct QueryEngine<'a, S: ?Sized, A: ?Sized> {
    store: SnapshotStore,
    scheduler: &'a S,
    audit: &'a A,
    settings: Settings,
}

impl<'a, S, A> QueryEngine<'a, S, A>
where
    S: Scheduler + ?Sized,
    A: AuditLog + ?Sized,
{
    pub fn new(store: SnapshotStore, scheduler: &'a S, audit: &'a A, settings: Settings) -> Self {
        Self {
            store,
            scheduler,
            audit,
            settings,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Answer an invocation with the given arguments
    pub fn run(&self, args: Vec<OsString>) -> Outcome {
        match parse_job_id(&args) {
            Some(job_id) => self.answer(job_id, args),
            None => self.fallback(None, args, FallbackReason::UnsupportedArguments),
        }
    }

    fn answer(&self, job_id: u64, args: Vec<OsString>) -> Outcome {
        let modified = self.store.modified();
        if cache::is_expired(modified, self.settings.lifetime, SystemTime::now()) {
            self.record(Some(job_id), Decision::Expired);
            if let Err(reason) = self.refresh(job_id, false) {
                return self.fallback(Some(job_id), args, reason);
            }
        }

        let snapshot = match self.store.read() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return self.fallback(Some(job_id), args, FallbackReason::SnapshotUnreadable(err))
            }
        };
        if let Some(rendered) = cache::resolve(&snapshot, job_id) {
            self.record(Some(job_id), Decision::Hit);
            return Outcome::Hit(rendered);
        }

        if cache::is_overflow(&snapshot, job_id) {
            self.record(
                Some(job_id),
                Decision::Overflow {
                    max_cached: snapshot.max_job_id(),
                },
            );
            if let Err(reason) = self.refresh(job_id, true) {
                return self.fallback(Some(job_id), args, reason);
            }

            let snapshot = match self.store.read() {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    return self.fallback(
                        Some(job_id),
                        args,
                        FallbackReason::SnapshotUnreadable(err),
                    )
                }
            };
            if let Some(rendered) = cache::resolve(&snapshot, job_id) {
                self.record(Some(job_id), Decision::Hit);
                return Outcome::Hit(rendered);
            }
        }

        self.record(Some(job_id), Decision::NotFound);
        Outcome::NotFound(self.store.kind().not_found(job_id))
    }

    /// One refresh attempt, audited
    fn refresh(&self, job_id: u64, forced: bool) -> Result<(), FallbackReason> {
        if !self.settings.maintain {
            return Err(FallbackReason::RefreshDisabled);
        }

        self.record(Some(job_id), Decision::RefreshAttempt { forced });
        match cache::refresh(&self.store, self.scheduler, &self.settings.extra_args) {
            Ok(bytes) => {
                self.record(Some(job_id), Decision::Refreshed { bytes });
                Ok(())
            }
            Err(failure) => {
                self.record(
                    Some(job_id),
                    Decision::RefreshFailed {
                        reason: failure.to_string(),
                    },
                );
                Err(FallbackReason::Refresh(failure))
            }
        }
    }

    fn fallback(&self, job_id: Option<u64>, args: Vec<OsString>, reason: FallbackReason) -> Outcome {
        self.record(
            job_id,
            Decision::Fallback {
                reason: reason.to_string(),
            },
        );
        Outcome::Fallback(Delegation {
            command: self.store.kind(),
            args,
            reason,
        })
    }

    fn record(&self, job_id: Option<u64>, decision: Decision) {
        self.audit.record(&AuditEvent {
            command: self.store.kind(),
            job_id,
            decision,
        });
    }
}
