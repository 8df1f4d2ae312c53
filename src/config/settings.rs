use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::paths::Paths;
use crate::error::{Result, SchedCacheError};
use crate::scheduler::CommandKind;

/// Default snapshot lifetime: 10 minutes
pub const DEFAULT_LIFETIME_SECS: u64 = 600;

/// Keys accepted by `config set`
pub const SETTABLE_KEYS: &[&str] = &[
    "cache.directory",
    "cache.lifetime_secs",
    "cache.maintain",
    "cache.extra_args",
    "logging.debug",
    "logging.file",
    "commands.bjobs",
    "commands.bhist",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,

    /// Audit log destinations
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Locations of the real scheduler commands
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Snapshot cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Where snapshot and lock files live (platform temp dir when unset)
    pub directory: Option<PathBuf>,
    /// Snapshot age at which a refresh is required
    pub lifetime_secs: u64,
    /// When false an expired snapshot is never refreshed; queries fall back instead
    pub maintain: bool,
    /// Appended to `-a` on full-listing refreshes only
    pub extra_args: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            lifetime_secs: DEFAULT_LIFETIME_SECS,
            maintain: true,
            extra_args: Vec::new(),
        }
    }
}

/// Audit log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Echo audit lines to stderr
    pub debug: bool,
    /// Append audit lines to a per-user log file in the cache directory
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            file: true,
        }
    }
}

/// Explicit paths to the real scheduler commands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    pub bjobs: Option<PathBuf>,
    pub bhist: Option<PathBuf>,
}

impl CommandsConfig {
    /// Configured program for a command kind, if any
    pub fn get(&self, kind: CommandKind) -> Option<&Path> {
        match kind {
            CommandKind::Listing => self.bjobs.as_deref(),
            CommandKind::History => self.bhist.as_deref(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, then apply environment overrides
    ///
    /// Without `HOME` (cron, batch jobs, `env -i`) there is no config file to
    /// read, so only defaults and overrides apply.
    pub fn load() -> Result<Self> {
        let mut config = match Paths::new() {
            Ok(paths) => Self::load_from(&paths)?,
            Err(SchedCacheError::Env(_)) => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific paths instance
    pub fn load_from(paths: &Paths) -> Result<Self> {
        if !paths.config_exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&paths.config_file)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let paths = Paths::new()?;
        self.save_to(&paths)
    }

    /// Save configuration to a specific paths instance
    pub fn save_to(&self, paths: &Paths) -> Result<()> {
        paths.ensure_dirs()?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&paths.config_file, &contents)?;

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&paths.config_file, perms)?;
        }

        Ok(())
    }

    /// Apply `SCHEDCACHE_*` overrides using `lookup` to read variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = get("SCHEDCACHE_DIR") {
            self.cache.directory = Some(PathBuf::from(dir));
        }
        if let Some(lifetime) = get("SCHEDCACHE_LIFETIME") {
            self.cache.lifetime_secs = parse_secs("SCHEDCACHE_LIFETIME", &lifetime)?;
        }
        if let Some(maintain) = get("SCHEDCACHE_MAINTAIN") {
            self.cache.maintain = parse_bool("SCHEDCACHE_MAINTAIN", &maintain)?;
        }
        if let Some(extra) = get("SCHEDCACHE_EXTRA_ARGS") {
            self.cache.extra_args = split_args(&extra);
        }
        if let Some(debug) = get("SCHEDCACHE_DEBUG") {
            self.logging.debug = parse_bool("SCHEDCACHE_DEBUG", &debug)?;
        }
        if let Some(bjobs) = get("SCHEDCACHE_BJOBS") {
            self.commands.bjobs = Some(PathBuf::from(bjobs));
        }
        if let Some(bhist) = get("SCHEDCACHE_BHIST") {
            self.commands.bhist = Some(PathBuf::from(bhist));
        }

        Ok(())
    }

    /// Set a single `section.key` value from its string form
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cache.directory" => self.cache.directory = Some(PathBuf::from(value)),
            "cache.lifetime_secs" => self.cache.lifetime_secs = parse_secs(key, value)?,
            "cache.maintain" => self.cache.maintain = parse_bool(key, value)?,
            "cache.extra_args" => self.cache.extra_args = split_args(value),
            "logging.debug" => self.logging.debug = parse_bool(key, value)?,
            "logging.file" => self.logging.file = parse_bool(key, value)?,
            "commands.bjobs" => self.commands.bjobs = Some(PathBuf::from(value)),
            "commands.bhist" => self.commands.bhist = Some(PathBuf::from(value)),
            _ => {
                return Err(SchedCacheError::InvalidArgument(format!(
                    "Unknown config key: {}. Valid keys: {}",
                    key,
                    SETTABLE_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Directory holding snapshot, lock and log files
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Configured snapshot lifetime
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.cache.lifetime_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        SchedCacheError::config(format!(
            "{} must be a whole number of seconds, got '{}'",
            key, value
        ))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SchedCacheError::config(format!(
            "{} must be true or false, got '{}'",
            key, value
        ))),
    }
}

fn split_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
