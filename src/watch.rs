//! Polling a job until its status changes
//!
//! Each poll is an ordinary `bjobs <id>` query through the cache, so many
//! watchers share one snapshot instead of each listing the whole cluster.

use std::ffi::OsString;

use crate::audit::AuditLog;
use crate::error::{Result, SchedCacheError};
use crate::query::{Outcome, QueryEngine};
use crate::scheduler::Scheduler;

/// State reported for a job that no longer appears in the listing
pub const GONE: &str = "GONE";

/// When a watch fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    states: Vec<String>,
    /// Fire when the job leaves `states` instead of when it enters them
    negate: bool,
}

impl Condition {
    /// Build from a comma separated list such as `DONE,EXIT`
    pub fn new(states: &str, negate: bool) -> Result<Self> {
        let states: Vec<String> = states
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if states.is_empty() {
            return Err(SchedCacheError::InvalidArgument(
                "at least one job state is required".to_string(),
            ));
        }

        Ok(Self { states, negate })
    }

    pub fn is_met(&self, stat: &str) -> bool {
        let listed = self.states.iter().any(|s| s == stat);
        listed != self.negate
    }

    /// A job that left the listing has left every `--while` state, but has
    /// reached none of the `--until` states
    pub fn is_met_when_gone(&self) -> bool {
        self.negate
    }
}

/// Current `STAT` column of `job_id`, or `None` when the job isn't listed
pub fn poll<S, A>(engine: &QueryEngine<'_, S, A>, scheduler: &S, job_id: u64) -> Result<Option<String>>
where
    S: Scheduler + ?Sized,
    A: AuditLog + ?Sized,
{
    let text = match engine.run(vec![OsString::from(job_id.to_string())]) {
        Outcome::Hit(text) => text,
        Outcome::NotFound(_) => return Ok(None),
        Outcome::Fallback(delegation) => {
            let output = scheduler.capture(delegation.command, &delegation.args)?;
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
    };

    Ok(parse_stat(&text, job_id))
}

/// Pull the `STAT` field for `job_id` out of `bjobs` output
///
/// The column is located by name in the header line.
pub fn parse_stat(text: &str, job_id: u64) -> Option<String> {
    let mut lines = text.lines();
    let column = lines
        .next()?
        .split_whitespace()
        .position(|name| name == "STAT")?;

    let id = job_id.to_string();
    lines
        .find(|line| line.split_whitespace().next() == Some(id.as_str()))?
        .split_whitespace()
        .nth(column)
        .map(str::to_string)
}
