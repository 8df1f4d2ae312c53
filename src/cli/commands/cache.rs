//! Cache management commands

use chrono::{DateTime, Local};
use colored::Colorize;

use super::common::store_for;
use crate::cache::{self, SnapshotStatus};
use crate::cli::args::{CacheArgs, CacheCommands, OutputFormat};
use crate::config::Config;
use crate::duration::format_age;
use crate::error::Result;
use crate::scheduler::{CommandKind, SystemScheduler};

/// Handle cache commands
pub fn cache(config: &Config, user: &str, args: &CacheArgs, format: OutputFormat) -> Result<String> {
    match &args.command {
        CacheCommands::Status => status(config, user, format),
        CacheCommands::Refresh { command } => refresh(config, user, *command, format),
        CacheCommands::Clear => clear(config, user, format),
    }
}

fn status(config: &Config, user: &str, format: OutputFormat) -> Result<String> {
    let cache_dir = config.cache_dir();
    let status = cache::status(&cache_dir, user, config.lifetime());

    match format {
        OutputFormat::Pretty => {
            let mut output = String::new();
            output.push_str(&format!("{}\n", "Cache Status".bold()));
            output.push_str(&format!("Location: {}\n", cache_dir.display()));
            output.push_str(&format!("Lifetime: {}\n", format_age(status.lifetime_secs)));
            output.push_str(&format!(
                "Maintain: {}\n",
                if config.cache.maintain {
                    "yes".green()
                } else {
                    "no".yellow()
                }
            ));

            for snapshot in &status.snapshots {
                output.push('\n');
                output.push_str(&format_snapshot(snapshot));
            }

            Ok(output.trim_end().to_string())
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "cache_dir": cache_dir.to_string_lossy(),
                "user": user,
                "maintain": config.cache.maintain,
                "lifetime_secs": status.lifetime_secs,
                "snapshots": status.snapshots,
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }
    }
}

fn format_snapshot(snapshot: &SnapshotStatus) -> String {
    let mut output = format!("{}\n", format!("{}:", snapshot.command).dimmed());

    if !snapshot.exists {
        output.push_str(&format!("  {}\n", "Not cached".dimmed()));
        return output;
    }

    output.push_str(&format!("  File: {}\n", snapshot.path.display()));
    output.push_str(&format!("  Lock: {}\n", snapshot.lock_path.display()));
    if let Some(age) = snapshot.age_secs {
        let refreshed: DateTime<Local> = Local::now() - chrono::Duration::seconds(age as i64);
        let state = if snapshot.fresh {
            "(fresh)".green()
        } else {
            "(stale)".yellow()
        };
        output.push_str(&format!(
            "  Age: {} {} (refreshed {})\n",
            format_age(age),
            state,
            refreshed.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    match snapshot.rows {
        Some(rows) => output.push_str(&format!("  Jobs: {}\n", rows)),
        None => output.push_str(&format!("  {}\n", "Unreadable".red())),
    }
    if let Some(max) = snapshot.max_job_id {
        output.push_str(&format!("  Newest job: {}\n", max));
    }

    output
}

fn refresh(
    config: &Config,
    user: &str,
    only: Option<CommandKind>,
    format: OutputFormat,
) -> Result<String> {
    let scheduler = SystemScheduler::new(config.commands.clone());
    let kinds: Vec<CommandKind> = match only {
        Some(kind) => vec![kind],
        None => CommandKind::ALL.to_vec(),
    };

    let results: Vec<(CommandKind, std::result::Result<u64, String>)> = kinds
        .into_iter()
        .map(|kind| {
            let store = store_for(config, user, kind);
            let result = cache::refresh(&store, &scheduler, &config.cache.extra_args)
                .map_err(|e| e.to_string());
            match &result {
                Ok(bytes) => tracing::info!(command = %kind, bytes, "manual refresh"),
                Err(reason) => tracing::warn!(command = %kind, reason = %reason, "manual refresh failed"),
            }
            (kind, result)
        })
        .collect();

    match format {
        OutputFormat::Pretty => {
            let lines: Vec<String> = results
                .iter()
                .map(|(kind, result)| match result {
                    Ok(bytes) => format!("{} {} refreshed ({} bytes)", "✓".green(), kind, bytes),
                    Err(reason) => format!("{} {}: {}", "✗".red(), kind, reason),
                })
                .collect();
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let json: Vec<_> = results
                .iter()
                .map(|(kind, result)| match result {
                    Ok(bytes) => serde_json::json!({
                        "command": kind.program_name(),
                        "refreshed": true,
                        "bytes": bytes,
                    }),
                    Err(reason) => serde_json::json!({
                        "command": kind.program_name(),
                        "refreshed": false,
                        "reason": reason,
                    }),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&json)?)
        }
    }
}

fn clear(config: &Config, user: &str, format: OutputFormat) -> Result<String> {
    let removed = cache::clear_all(&config.cache_dir(), user)?;

    match format {
        OutputFormat::Pretty => Ok(format!(
            "{} Cache cleared ({} snapshot{} removed)",
            "✓".green(),
            removed,
            if removed == 1 { "" } else { "s" }
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "status": "cleared",
                "removed": removed,
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }
    }
}
