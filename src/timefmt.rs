//! Human-readable durations for recipe and step times
//!
//! Times travel as strings of seconds. Parsing is lenient: a leading integer
//! is taken as-is, anything unusable counts as zero.

/// Parse the leading integer of a seconds string
pub fn parse_seconds(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    let digits: String = raw
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// "45 sec", "12 min", "1h 5m" or "2h"
pub fn format_duration(raw: Option<&str>) -> String {
    let secs = parse_seconds(raw);
    if secs < 60 {
        format!("{} sec", secs)
    } else if secs < 3600 {
        format!("{} min", secs.div_ceil(60))
    } else {
        hours_and_minutes(secs / 3600, (secs % 3600).div_ceil(60))
    }
}

/// Whole minutes, rounded up
pub fn minutes(raw: Option<&str>) -> u64 {
    parse_seconds(raw).div_ceil(60)
}

/// "1h 5m", "2h" or "15m" for a number of seconds
pub fn format_hours_minutes(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600).div_ceil(60);
    if hours > 0 {
        hours_and_minutes(hours, mins)
    } else {
        format!("{}m", mins)
    }
}

fn hours_and_minutes(hours: u64, mins: u64) -> String {
    if mins > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}h", hours)
    }
}
