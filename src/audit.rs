//! Audit trail of cache decisions
//!
//! Every query records what happened to it (hit, miss, refresh, fallback)
//! through an [`AuditLog`]. The default implementation emits `tracing`
//! events; [`init_logging`] routes them to a per-user log file in the cache
//! directory and, in debug mode, to stderr.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use is_terminal::IsTerminal;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::EnvFilter, fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::Config;
use crate::scheduler::CommandKind;

/// Environment variable holding an `EnvFilter` directive for the audit log
pub const LOG_FILTER_ENV: &str = "SCHEDCACHE_LOG";

/// One recorded decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub command: CommandKind,
    pub job_id: Option<u64>,
    pub decision: Decision,
}

/// What the cache decided at one step of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The snapshot was missing or older than its lifetime
    Expired,
    RefreshAttempt { forced: bool },
    Refreshed { bytes: u64 },
    RefreshFailed { reason: String },
    Hit,
    /// Miss for an id newer than anything in the snapshot
    Overflow { max_cached: Option<u64> },
    NotFound,
    Fallback { reason: String },
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::RefreshAttempt { forced: false } => "refresh",
            Self::RefreshAttempt { forced: true } => "forced-refresh",
            Self::Refreshed { .. } => "refreshed",
            Self::RefreshFailed { .. } => "refresh-failed",
            Self::Hit => "hit",
            Self::Overflow { .. } => "overflow",
            Self::NotFound => "not-found",
            Self::Fallback { .. } => "fallback",
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.command)?;
        match self.job_id {
            Some(id) => write!(f, "{}", id)?,
            None => f.write_str("-")?,
        }
        write!(f, ": {}", self.decision.label())?;
        match &self.decision {
            Decision::Refreshed { bytes } => write!(f, " ({} bytes)", bytes),
            Decision::RefreshFailed { reason } | Decision::Fallback { reason } => {
                write!(f, " ({})", reason)
            }
            Decision::Overflow {
                max_cached: Some(max),
            } => write!(f, " (newest cached {})", max),
            _ => Ok(()),
        }
    }
}

/// Sink for audit events
///
/// Recording must never fail or influence the query's result.
pub trait AuditLog {
    fn record(&self, event: &AuditEvent);
}

/// Emits each event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn record(&self, event: &AuditEvent) {
        let command = event.command.program_name();
        let job_id = event.job_id;
        let decision = event.decision.label();
        let pid = std::process::id();

        match &event.decision {
            Decision::RefreshFailed { reason } | Decision::Fallback { reason } => {
                tracing::warn!(pid, command, job_id, decision, reason = %reason, "{}", event);
            }
            _ => {
                tracing::info!(pid, command, job_id, decision, "{}", event);
            }
        }
    }
}

/// Days of audit log kept in the cache directory
pub const LOG_RETENTION_DAYS: usize = 7;

/// Install the global subscriber for audit events
///
/// The log file rolls daily (`schedcache-<user>.<date>.log`) and only the
/// last [`LOG_RETENTION_DAYS`] files are kept. Errors setting up the file
/// are ignored; logging is best effort.
pub fn init_logging(config: &Config, user: &str) {
    let file_layer = if config.logging.file {
        let dir = config.cache_dir();
        let _ = fs::create_dir_all(&dir);
        log_appender(&dir, user).map(|appender| {
            layer_fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(false)
        })
    } else {
        None
    };

    let stderr_layer = config.logging.debug.then(|| {
        layer_fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
    });

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("schedcache=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}

fn log_appender(dir: &Path, user: &str) -> Option<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("schedcache-{}", user))
        .filename_suffix("log")
        .max_log_files(LOG_RETENTION_DAYS)
        .build(dir)
        .ok()
}
