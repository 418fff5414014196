//! Time formatting helpers for countdown display.

/// Format seconds as `M:SS` (e.g. `1:45`, `12:03`)
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format seconds as a human-readable duration (`1h 30min`, `5 min`, `45s`)
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}min", hours, minutes)
    } else if minutes > 0 {
        format!("{} min", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Parse `M:SS` into seconds; the seconds part must be below 60
pub fn parse_clock(input: &str) -> Option<u32> {
    let (minutes, seconds) = input.trim().split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}
