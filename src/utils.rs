use chrono::{DateTime, Local};
use crossterm::style::Color;
use std::hash::{Hash, Hasher};

/// Render epoch milliseconds as local wall-clock time, second precision.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string(),
        None => millis.to_string(),
    }
}

/// RFC 3339 in UTC, used in verbose records.
pub fn format_timestamp_utc(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// Generate a color for a string based on hash.
pub fn get_color(s: &str) -> Color {
    let colors = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::AnsiValue(91),
        Color::AnsiValue(92),
        Color::AnsiValue(94),
        Color::AnsiValue(93),
        Color::AnsiValue(95),
        Color::AnsiValue(96),
    ];
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    let hash = hasher.finish() as u32;
    colors[(hash % colors.len() as u32) as usize]
}
