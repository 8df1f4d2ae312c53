//! Turning an [`Outcome`] into process output
//!
//! This is the only place that writes the emulated command's streams or
//! hands the process over to the real command.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use crate::audit::{init_logging, TracingAudit};
use crate::cache::SnapshotStore;
use crate::config::{current_user, Config};
use crate::error::{Result, SchedCacheError};
use crate::query::{Outcome, QueryEngine, Settings};
use crate::scheduler::{CommandKind, Scheduler, Stream, SystemScheduler};

/// Run one emulated invocation end to end and return its exit status
///
/// On Unix a fallback never returns: the process becomes the real command.
pub fn emulate(kind: CommandKind, args: Vec<OsString>) -> Result<i32> {
    let config = Config::load()?;
    let user = current_user();
    init_logging(&config, &user);

    let scheduler = SystemScheduler::new(config.commands.clone());
    let store = SnapshotStore::new(&config.cache_dir(), &user, kind);
    let engine = QueryEngine::new(store, &scheduler, &TracingAudit, Settings::from(&config));

    let outcome = engine.run(args);
    emit(outcome, &scheduler, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// Write a cached answer to the given streams, or delegate a fallback
pub fn emit<S, O, E>(outcome: Outcome, scheduler: &S, stdout: &mut O, stderr: &mut E) -> Result<i32>
where
    S: Scheduler + ?Sized,
    O: Write,
    E: Write,
{
    match outcome {
        Outcome::Hit(text) => {
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(0)
        }
        Outcome::NotFound(not_found) => {
            let stream: &mut dyn Write = match not_found.stream {
                Stream::Stdout => stdout,
                Stream::Stderr => stderr,
            };
            stream.write_all(not_found.message.as_bytes())?;
            stream.flush()?;
            Ok(not_found.exit_code)
        }
        Outcome::Fallback(delegation) => {
            let program = scheduler.program(delegation.command)?;
            stdout.flush()?;
            stderr.flush()?;
            delegate(&program, &delegation.args)
        }
    }
}

/// Replace this process with `program args...`
#[cfg(unix)]
pub fn delegate(program: &Path, args: &[OsString]) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    let source = Command::new(program).args(args).exec();
    Err(SchedCacheError::Delegate {
        program: program.display().to_string(),
        source,
    })
}

/// Run `program args...` with inherited streams and return its exit status
#[cfg(not(unix))]
pub fn delegate(program: &Path, args: &[OsString]) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| SchedCacheError::Delegate {
            program: program.display().to_string(),
            source,
        })?;
    Ok(status.code().unwrap_or(1))
}
