use thiserror::Error;

/// Result type alias for schedcache operations
pub type Result<T> = std::result::Result<T, SchedCacheError>;

/// Exit status for an invocation name that names no scheduler command
pub const EXIT_CONFIGURATION: i32 = 64;

/// Exit status when the real scheduler command cannot be started
pub const EXIT_NOT_EXECUTABLE: i32 = 127;

/// Errors that can occur during schedcache operations
#[derive(Error, Debug)]
pub enum SchedCacheError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The binary was invoked under a name that doesn't map to a command
    #[error("Cannot tell which scheduler command to emulate from invocation name '{0}' (expected a name containing 'bjobs' or 'bhist')")]
    UnknownInvocation(String),

    /// The real scheduler command couldn't be located
    #[error("Cannot find the real '{0}' command on PATH. Set commands.{0} in the config file.")]
    CommandNotFound(String),

    /// Delegating to the real command failed
    #[error("Failed to run {program}: {source}")]
    Delegate {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to write config file: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Watched job no longer appears in the listing
    #[error("Job {0} is no longer listed")]
    JobGone(u64),

    /// Stopped by Ctrl+C
    #[error("Interrupted")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

impl SchedCacheError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Process exit status to use when this error ends the program
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Toml(_) | Self::UnknownInvocation(_) => EXIT_CONFIGURATION,
            Self::CommandNotFound(_) | Self::Delegate { .. } => EXIT_NOT_EXECUTABLE,
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

/// Why a snapshot refresh did not install a new snapshot
///
/// Every variant is recovered by falling back to the real command.
#[derive(Error, Debug)]
pub enum RefreshFailure {
    /// Another process holds the refresh lock
    #[error("refresh lock is held by another process")]
    LockContention,

    /// The full listing exited non-zero, failed to start, or printed nothing
    #[error("full listing failed: {0}")]
    CommandFailed(String),

    /// Cache directory, lock file or temporary file trouble
    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),
}
