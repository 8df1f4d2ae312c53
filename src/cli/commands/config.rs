use colored::Colorize;

use crate::cli::args::{ConfigArgs, ConfigCommands, OutputFormat};
use crate::config::{Config, Paths};
use crate::error::Result;

/// Handle the config command
pub fn config(config: &mut Config, args: &ConfigArgs, format: OutputFormat) -> Result<String> {
    match &args.command {
        ConfigCommands::Show => config_show(config, format),
        ConfigCommands::Set { key, value } => config_set(config, key, value, format),
        ConfigCommands::Path => config_path(format),
    }
}

/// Show current configuration
fn config_show(config: &Config, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pretty => {
            let not_set = || "(not set)".dimmed().to_string();
            let mut output = String::new();
            output.push_str(&format!("{}\n", "Configuration".bold()));
            output.push_str(&"─".repeat(40));
            output.push('\n');

            output.push_str(&format!("\n{}\n", "[cache]".cyan()));
            output.push_str(&format!(
                "  directory = {}\n",
                config
                    .cache
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| format!("{} (default)", config.cache_dir().display()))
            ));
            output.push_str(&format!("  lifetime_secs = {}\n", config.cache.lifetime_secs));
            output.push_str(&format!("  maintain = {}\n", config.cache.maintain));
            output.push_str(&format!(
                "  extra_args = {}\n",
                if config.cache.extra_args.is_empty() {
                    not_set()
                } else {
                    config.cache.extra_args.join(" ")
                }
            ));

            output.push_str(&format!("\n{}\n", "[logging]".cyan()));
            output.push_str(&format!("  debug = {}\n", config.logging.debug));
            output.push_str(&format!("  file = {}\n", config.logging.file));

            output.push_str(&format!("\n{}\n", "[commands]".cyan()));
            for (name, path) in [
                ("bjobs", &config.commands.bjobs),
                ("bhist", &config.commands.bhist),
            ] {
                output.push_str(&format!(
                    "  {} = {}\n",
                    name,
                    path.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| format!("{} (search PATH)", not_set()))
                ));
            }

            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
    }
}

/// Set a configuration value
///
/// Only the file contents are rewritten; environment overrides in effect
/// for this run are not persisted.
fn config_set(config: &mut Config, key: &str, value: &str, format: OutputFormat) -> Result<String> {
    let paths = Paths::new()?;
    let mut on_disk = Config::load_from(&paths)?;
    on_disk.set_value(key, value)?;
    on_disk.save_to(&paths)?;
    config.set_value(key, value)?;

    match format {
        OutputFormat::Pretty => Ok(format!("{} Set {} = {}", "✓".green(), key, value)),
        OutputFormat::Json => {
            let result = serde_json::json!({
                "success": true,
                "key": key,
                "value": value
            });
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}

/// Show configuration file path
fn config_path(format: OutputFormat) -> Result<String> {
    let paths = Paths::new()?;

    match format {
        OutputFormat::Pretty => {
            let mut output = String::new();
            output.push_str(&format!("Config file: {}\n", paths.config_file.display()));
            output.push_str(&format!(
                "Exists: {}\n",
                if paths.config_exists() {
                    "yes".green()
                } else {
                    "no".yellow()
                }
            ));
            Ok(output)
        }
        OutputFormat::Json => {
            let result = serde_json::json!({
                "path": paths.config_file.display().to_string(),
                "exists": paths.config_exists()
            });
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}
