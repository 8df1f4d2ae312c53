use std::ffi::OsString;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::scheduler::CommandKind;

/// Snapshot cache for single-job bjobs and bhist lookups
///
/// Link this binary as `bjobs` or `bhist` ahead of the real commands on PATH
/// to serve single-job queries from a shared snapshot.
#[derive(Parser)]
#[command(name = "schedcache")]
#[command(version, propagate_version = true)]
#[command(about = "Snapshot cache for single-job bjobs and bhist lookups")]
pub struct Cli {
    /// Output format for command results
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Write shell completions to stdout
    pub fn print_completions(shell: Shell) {
        clap_complete::generate(shell, &mut Cli::command(), "schedcache", &mut std::io::stdout());
    }
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored, human-readable output
    #[default]
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Answer a bjobs/bhist invocation through the cache
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Manage local cache
    Cache(CacheArgs),

    /// Wait for a job to reach (or leave) a state
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the query command
#[derive(Args)]
pub struct QueryArgs {
    /// Command to emulate
    #[arg(value_enum)]
    pub command: CommandKind,

    /// Arguments exactly as they would be passed to the real command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

/// Arguments for the cache command
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

/// Cache subcommands
#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show snapshot age and contents
    Status,
    /// Refresh snapshots now
    Refresh {
        /// Only refresh this command's snapshot
        #[arg(value_enum)]
        command: Option<CommandKind>,
    },
    /// Delete your snapshots
    Clear,
}

/// Arguments for the watch command
#[derive(Args)]
pub struct WatchArgs {
    /// Job to watch
    pub job_id: u64,

    /// Comma separated job states to wait for
    #[arg(short, long, default_value = "DONE,EXIT")]
    pub until: String,

    /// Fire when the job leaves the --until states instead
    #[arg(long = "while")]
    pub negate: bool,

    /// Time between polls (e.g. 90, 30s, 5m)
    #[arg(short, long, default_value = "1m")]
    pub interval: String,

    /// Shell command to run when the condition is met (gets JOB_ID and JOB_STAT)
    #[arg(short, long)]
    pub exec: Option<String>,

    /// Show a desktop notification when the condition is met
    #[arg(short, long)]
    pub notify: bool,
}

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.lifetime_secs)
        key: String,
        /// Value to set
        value: String,
    },
    /// Show configuration file path
    Path,
}

/// Arguments for the completions command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
