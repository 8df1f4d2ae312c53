use std::fs;
use std::path::PathBuf;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::Result;

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV: &str = "SCHEDCACHE_CONFIG";

/// Manages paths for schedcache configuration
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root configuration directory (~/.schedcache)
    pub root: PathBuf,
    /// Configuration file path (~/.schedcache/config.toml)
    pub config_file: PathBuf,
}

impl Paths {
    /// Create a new Paths instance using the user's home directory,
    /// or the file named by `SCHEDCACHE_CONFIG` when set
    pub fn new() -> Result<Self> {
        if let Some(file) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            let config_file = PathBuf::from(file);
            let root = config_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(Self { root, config_file });
        }

        let home = std::env::var("HOME")?;
        if home.is_empty() {
            return Err(std::env::VarError::NotPresent.into());
        }
        let root = PathBuf::from(home).join(".schedcache");

        Ok(Self {
            config_file: root.join("config.toml"),
            root,
        })
    }

    /// Ensure the configuration directory exists with proper permissions
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(&self.root, perms)?;
        }

        Ok(())
    }

    /// Check if the config file exists
    pub fn config_exists(&self) -> bool {
        self.config_file.exists()
    }
}

/// Name of the calling user, made safe for use inside a file name
///
/// Each user gets their own snapshot files, so two users never read each
/// other's listings even when they share a cache directory. The name comes
/// from the account database for the effective uid, never from `USER`.
pub fn current_user() -> String {
    match whoami::fallible::username() {
        Ok(name) if !name.is_empty() => sanitize_user(&name),
        _ => uid_name(),
    }
}

/// Stand-in for uids with no account entry (containers, some batch nodes)
#[cfg(unix)]
fn uid_name() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail
    let uid = unsafe { libc::geteuid() };
    format!("uid{}", uid)
}

#[cfg(not(unix))]
fn uid_name() -> String {
    "unknown".to_string()
}

fn sanitize_user(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
