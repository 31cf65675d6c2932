// Utility functions
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};

/// Rounds to `decimals` places. Non-finite values pass through untouched.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Parses the `datetime('now')` format SQLite writes ("%Y-%m-%d %H:%M:%S").
pub fn parse_sqlite_datetime(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")?;
    Ok(Utc.from_utc_datetime(&naive))
}
