//! Running the real scheduler commands

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::kind::CommandKind;
use crate::config::CommandsConfig;
use crate::error::{Result, SchedCacheError};

/// Captured result of a direct command invocation
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, or -1 when the process was killed by a signal
    pub exit_code: i32,
}

/// Access to the real scheduler commands
pub trait Scheduler {
    /// Path of the real program for `kind`
    fn program(&self, kind: CommandKind) -> Result<PathBuf>;

    /// Run `<program> -a <extra_args>` with stdout written into `sink`.
    ///
    /// Returns the exit code. Stderr is discarded.
    fn list_all(&self, kind: CommandKind, extra_args: &[String], sink: File) -> Result<i32> {
        let program = self.program(kind)?;
        let status = Command::new(&program)
            .arg("-a")
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(sink))
            .stderr(Stdio::null())
            .status()
            .map_err(|source| SchedCacheError::Delegate {
                program: program.display().to_string(),
                source,
            })?;

        Ok(status.code().unwrap_or(-1))
    }

    /// Run the program with `args`, capturing both streams
    fn capture(&self, kind: CommandKind, args: &[OsString]) -> Result<CommandOutput> {
        let program = self.program(kind)?;
        let output = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SchedCacheError::Delegate {
                program: program.display().to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// The scheduler installed on this machine
#[derive(Debug, Clone, Default)]
pub struct SystemScheduler {
    configured: CommandsConfig,
}

impl SystemScheduler {
    pub fn new(configured: CommandsConfig) -> Self {
        Self { configured }
    }
}

impl Scheduler for SystemScheduler {
    fn program(&self, kind: CommandKind) -> Result<PathBuf> {
        if let Some(path) = self.configured.get(kind) {
            return Ok(path.to_path_buf());
        }

        let path_var = std::env::var_os("PATH").unwrap_or_default();
        let me = std::env::current_exe()
            .and_then(|exe| exe.canonicalize())
            .ok();

        locate(kind.program_name(), &path_var, me.as_deref())
            .ok_or_else(|| SchedCacheError::CommandNotFound(kind.program_name().to_string()))
    }
}

/// Search `path_var` for an executable called `name`, skipping `skip`
///
/// The cache is normally installed as a `bjobs`/`bhist` symlink ahead of the
/// real command on `PATH`; without the skip it would find and run itself.
pub fn locate(name: &str, path_var: &OsStr, skip: Option<&Path>) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .filter(|candidate| is_executable(candidate))
        .find(|candidate| match (skip, candidate.canonicalize()) {
            (Some(me), Ok(resolved)) => resolved != me,
            _ => true,
        })
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
