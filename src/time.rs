//! Time utilities.
//!
//! Timestamps from the service are Unix seconds. Views render them with
//! a short month, day and year ("Jan 5, 2021").

use chrono::{DateTime, Utc};

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Format a Unix timestamp (seconds) for display.
///
/// Out-of-range timestamps fall back to the Unix epoch.
pub fn format_date(timestamp: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    date.format("%b %-d, %Y").to_string()
}

/// The "Created at …" line shown under a discussion's creator.
pub fn created_at_label(timestamp: i64) -> String {
    format!("Created at {}", format_date(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_format_date() {
        // 2021-01-05T12:00:00Z
        assert_eq!(format_date(1609848000), "Jan 5, 2021");
        assert_eq!(created_at_label(1609848000), "Created at Jan 5, 2021");
    }

    #[test]
    fn test_format_date_out_of_range() {
        assert_eq!(format_date(i64::MAX), "Jan 1, 1970");
    }
}
