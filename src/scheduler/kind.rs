//! Output schema of the two emulated scheduler commands

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;

/// Which stream a not-found message goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// How the real command reports a job id that doesn't exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub stream: Stream,
    /// Full message including the trailing newline
    pub message: String,
    pub exit_code: i32,
}

/// A scheduler status command the cache can stand in for
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `bjobs`: one header line, one row per job
    #[value(name = "bjobs")]
    Listing,
    /// `bhist`: two header lines, one row per job, blank line after
    #[value(name = "bhist")]
    History,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Listing, CommandKind::History];

    /// Name of the real program
    pub fn program_name(self) -> &'static str {
        match self {
            Self::Listing => "bjobs",
            Self::History => "bhist",
        }
    }

    /// Number of header lines at the top of the full listing
    pub fn header_lines(self) -> usize {
        match self {
            Self::Listing => 1,
            Self::History => 2,
        }
    }

    /// Lines in a correctly rendered single-job answer
    pub fn lines_per_match(self) -> usize {
        match self {
            Self::Listing => 2,
            Self::History => 4,
        }
    }

    /// Whether the real command ends a single-job answer with a blank line
    pub fn trailing_blank(self) -> bool {
        matches!(self, Self::History)
    }

    /// Exactly what the real command prints for an unknown job id
    pub fn not_found(self, job_id: u64) -> NotFound {
        match self {
            Self::Listing => NotFound {
                stream: Stream::Stderr,
                message: format!("Job <{}> is not found\n", job_id),
                exit_code: 0,
            },
            Self::History => NotFound {
                stream: Stream::Stdout,
                message: "No matching job found\n".to_string(),
                exit_code: 255,
            },
        }
    }

    /// Work out the emulated command from the name this binary was run as
    ///
    /// Matches on the file name only, so `/usr/local/bin/bjobs` and
    /// `bjobs-cached` both select the listing command.
    pub fn from_invocation(argv0: &OsStr) -> Option<Self> {
        let name = Path::new(argv0).file_name()?.to_str()?;
        if name.contains("bjobs") {
            Some(Self::Listing)
        } else if name.contains("bhist") {
            Some(Self::History)
        } else {
            None
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_name())
    }
}
