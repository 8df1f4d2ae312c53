//! Human-friendly durations for the watcher and status output
//!
//! Supports formats:
//! - Bare seconds: 90
//! - Relative: 30s, 5m, 1h, 1d

use std::time::Duration;

use crate::error::{Result, SchedCacheError};

/// Parse a polling interval such as `90`, `30s`, `5m` or `1h`
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let parsed = if s.chars().all(|c| c.is_ascii_digit()) {
        s.parse::<u64>().ok()
    } else {
        parse_relative(&s)
    };

    match parsed {
        Some(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(SchedCacheError::InvalidArgument(format!(
            "Invalid interval: '{}'. Use formats like: 90, 30s, 5m, 1h",
            s
        ))),
    }
}

/// Parse `<number><unit>` into seconds
fn parse_relative(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    // Find where the number ends and the unit begins
    let split_idx = s.find(|c: char| !c.is_ascii_digit())?;
    let (num_str, unit) = s.split_at(split_idx);
    let num: u64 = num_str.parse().ok()?;

    let multiplier = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        _ => return None,
    };

    num.checked_mul(multiplier)
}

/// Format age in human-readable form
pub fn format_age(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_seconds() {
        assert_eq!(parse_interval("90").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_interval("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_interval(" 10MIN ").unwrap(), Duration::from_secs(600));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_interval("").is_err());
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("abc").is_err());
        assert!(parse_interval("5x").is_err());
        assert!(parse_interval("m5").is_err());
        assert!(parse_interval("-5m").is_err());
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(125), "2m 5s");
        assert_eq!(format_age(7260), "2h 1m");
    }
}
