use crate::db::models::parse_timestamp;
use crate::error::TimestampError;
use chrono::{Datelike, Duration, Timelike};

/// `16.5 2015 23:13:31`
pub fn format_time<T: Datelike + Timelike>(time: &T) -> String {
    format!(
        "{}.{} {} {:02}:{:02}:{:02}",
        time.day(),
        time.month(),
        time.year(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// `8.5 2015 5:05`
pub fn format_time_short<T: Datelike + Timelike>(time: &T) -> String {
    format!(
        "{}.{} {} {}:{:02}",
        time.day(),
        time.month(),
        time.year(),
        time.hour(),
        time.minute()
    )
}

pub fn format_timestamp(value: &str) -> Result<String, TimestampError> {
    parse_timestamp(value).map(|time| format_time(&time))
}

pub fn format_timestamp_short(value: &str) -> Result<String, TimestampError> {
    parse_timestamp(value).map(|time| format_time_short(&time))
}

pub fn format_duration(duration: Duration) -> String {
    format_duration_seconds(duration.num_seconds().max(0) as u64)
}

pub fn format_duration_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remain_seconds = seconds % 60;

    if hours > 0 {
        if remain_seconds == 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h {minutes}m {remain_seconds}s")
        }
    } else if minutes > 0 {
        if remain_seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {remain_seconds}s")
        }
    } else {
        format!("{remain_seconds}s")
    }
}
