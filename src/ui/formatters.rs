use chrono::{DateTime, Local, Utc};
use humansize::{format_size as human_format_size, BINARY};

use crate::core::process_monitor::NOT_AVAILABLE;

/// Format a byte count in human-readable binary units (KiB, MiB, GiB)
pub fn format_bytes(bytes: u64) -> String {
    human_format_size(bytes, BINARY)
}

/// Format a process uptime using its two most significant units.
///
/// `None` (start time unknown) renders as `N/A`.
pub fn format_running_time(elapsed: Option<chrono::Duration>) -> String {
    let Some(elapsed) = elapsed else {
        return NOT_AVAILABLE.to_string();
    };

    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    let minutes = elapsed.num_minutes() % 60;
    let seconds = elapsed.num_seconds() % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

/// Format a start time in local time (YYYY-MM-DD HH:MM:SS)
pub fn format_start_time(start: Option<DateTime<Utc>>) -> String {
    match start {
        Some(start) => start
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}
