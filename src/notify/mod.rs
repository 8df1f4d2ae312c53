//! Desktop notification support for the job watcher
//!
//! Provides cross-platform notifications for macOS and Linux.

use notify_rust::Notification;

/// Send a notification that a watched job reached the awaited state
pub fn job_state_reached(job_id: u64, stat: &str) {
    let icon = match stat {
        "DONE" => "dialog-positive",
        "EXIT" => "dialog-error",
        "PSUSP" | "USUSP" | "SSUSP" => "dialog-warning",
        _ => "dialog-information",
    };

    let _ = Notification::new()
        .summary(&format!("Job {}: {}", job_id, stat))
        .body(&format!("Job <{}> is now {}", job_id, stat))
        .icon(icon)
        .appname("schedcache")
        .timeout(5000) // 5 seconds
        .show();
}
