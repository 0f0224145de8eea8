//! Text formatting for table cells.

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SECOND: i64 = 1;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Human relative time, e.g. "5 minutes ago" or "in a day".
///
/// Thresholds: under 45 s is "a few seconds", under 90 s "a minute", under
/// 45 min in minutes, under 90 min "an hour", under 22 h in hours, under
/// 36 h "a day", under 26 d in days, under 45 d "a month", under 320 d in
/// months, under 548 d "a year", then years.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(timestamp).num_seconds();
    let phrase = relative_phrase(delta.unsigned_abs() as i64);
    if delta < 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn relative_phrase(seconds: i64) -> String {
    let round = |unit: i64| (seconds as f64 / unit as f64).round() as i64;
    match seconds {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * MINUTE => format!("{} minutes", round(MINUTE).max(2)),
        s if s < 90 * MINUTE => "an hour".to_string(),
        s if s < 22 * HOUR => format!("{} hours", round(HOUR).max(2)),
        s if s < 36 * HOUR => "a day".to_string(),
        s if s < 26 * DAY => format!("{} days", round(DAY).max(2)),
        s if s < 45 * DAY => "a month".to_string(),
        s if s < 320 * DAY => format!("{} months", (round(DAY) as f64 / 30.4).round().max(2.0) as i64),
        s if s < 548 * DAY => "a year".to_string(),
        _ => format!("{} years", (round(DAY) as f64 / 365.0).round().max(2.0) as i64),
    }
}

/// Absolute local-independent timestamp for the detail view.
pub fn absolute_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

/// Duration cell: sub-millisecond precision only where it matters.
pub fn duration(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else if ms >= 10.0 {
        format!("{:.0} ms", ms)
    } else {
        format!("{:.2} ms", ms)
    }
}

/// Cut `text` to at most `max_width` terminal columns, marking the cut with `…`.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
