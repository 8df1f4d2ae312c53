//! Watch command: poll one job until its state satisfies a condition

use std::process::Command;

use colored::Colorize;

use super::common::{setup_interrupt_handler, sleep_unless_interrupted, store_for};
use crate::audit::TracingAudit;
use crate::cli::args::{OutputFormat, WatchArgs};
use crate::config::Config;
use crate::duration::parse_interval;
use crate::error::{Result, SchedCacheError};
use crate::notify;
use crate::query::{QueryEngine, Settings};
use crate::scheduler::{CommandKind, SystemScheduler};
use crate::watch::{poll, Condition, GONE};

/// Handle the watch command
pub fn watch(config: &Config, user: &str, args: &WatchArgs, format: OutputFormat) -> Result<String> {
    let condition = Condition::new(&args.until, args.negate)?;
    let interval = parse_interval(&args.interval)?;

    let scheduler = SystemScheduler::new(config.commands.clone());
    let store = store_for(config, user, CommandKind::Listing);
    let engine = QueryEngine::new(store, &scheduler, &TracingAudit, Settings::from(config));

    let interrupted = setup_interrupt_handler();
    eprintln!(
        "{} Watching job {} (Ctrl+C to stop)",
        "→".cyan(),
        args.job_id.to_string().bold()
    );

    let mut last: Option<String> = None;
    loop {
        let stat = match poll(&engine, &scheduler, args.job_id)? {
            Some(stat) => stat,
            None if condition.is_met_when_gone() => return fire(args, GONE, format),
            None => return Err(SchedCacheError::JobGone(args.job_id)),
        };

        if last.as_deref() != Some(stat.as_str()) {
            tracing::info!(job_id = args.job_id, stat = %stat, "job state");
            if format == OutputFormat::Pretty {
                eprintln!("  {} {}", "•".dimmed(), stat);
            }
        }

        if condition.is_met(&stat) {
            return fire(args, &stat, format);
        }
        last = Some(stat);

        if sleep_unless_interrupted(interval, &interrupted) {
            return Err(SchedCacheError::Interrupted);
        }
    }
}

/// Run the configured actions once the condition holds
fn fire(args: &WatchArgs, stat: &str, format: OutputFormat) -> Result<String> {
    if args.notify {
        notify::job_state_reached(args.job_id, stat);
    }

    let exec_status = match &args.exec {
        Some(cmd) => {
            let status = Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .env("JOB_ID", args.job_id.to_string())
                .env("JOB_STAT", stat)
                .status()?;
            Some(status.code().unwrap_or(1))
        }
        None => None,
    };

    match format {
        OutputFormat::Pretty => {
            let mut output = format!("{} Job {} is {}", "✓".green(), args.job_id, stat.bold());
            if let Some(code) = exec_status {
                if code == 0 {
                    output.push_str(&format!("\n{} --exec finished", "✓".green()));
                } else {
                    output.push_str(&format!("\n{} --exec exited with status {}", "✗".red(), code));
                }
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "job_id": args.job_id,
                "stat": stat,
                "exec_status": exec_status,
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }
    }
}
