//! Display formatting for crash fields.
//!
//! Every formatter is total: unparseable input falls back to the raw string
//! (dates) or to [`NOT_AVAILABLE`] (absent values), never to an error.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const NOT_AVAILABLE: &str = "N/A";

/// Parses the timestamp spellings the API emits: RFC 3339, or naive ISO-8601 read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// "Mar 04, 2025 14:03:09"
pub fn date(s: &str) -> String {
    match parse_timestamp(s) {
        Some(dt) => dt.format("%b %d, %Y %H:%M:%S").to_string(),
        None => s.to_string(),
    }
}

/// "5 minutes ago", "in about 2 hours". Relative to the current time.
pub fn relative_time(s: &str) -> String {
    relative_time_from(s, Utc::now())
}

pub fn relative_time_from(s: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(s) else {
        return s.to_string();
    };
    let delta = now.signed_duration_since(then);
    let seconds = delta.num_seconds().unsigned_abs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let distance = if seconds < 45 {
        "less than a minute".to_string()
    } else if minutes < 45 {
        plural(minutes.max(1), "minute")
    } else if hours < 24 {
        format!("about {}", plural(hours.max(1), "hour"))
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        format!("about {}", plural(days / 365, "year"))
    };

    if delta.num_seconds() >= 0 {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

pub fn g_force(value: f64) -> String {
    format!("{:.1} G", value)
}

pub fn speed(value: f64) -> String {
    format!("{:.1} km/h", value)
}

pub fn deceleration(value: f64) -> String {
    format!("{:.1} m/s²", value)
}

/// Formats GeoJSON-ordered `[lon, lat]` as "lat, lon" with six decimals.
pub fn coordinates(coords: [f64; 2]) -> String {
    format!("{:.6}, {:.6}", coords[1], coords[0])
}

/// Formats a ratio (0.92) as a percentage ("92.0%").
pub fn percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Applies `f` to a present value, or yields [`NOT_AVAILABLE`].
pub fn or_na(value: Option<f64>, f: fn(f64) -> String) -> String {
    value.map(f).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => NOT_AVAILABLE,
    }
}
