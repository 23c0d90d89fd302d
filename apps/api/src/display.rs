//! Response-boundary timestamp formatting.
//!
//! All timestamps are stored and compared as UTC; they are converted to
//! Indian Standard Time (UTC+05:30) only here, when a response is built.
//! IST has no daylight saving, so a fixed offset is correct year-round.

use chrono::{DateTime, FixedOffset, Utc};

/// IST offset from UTC in seconds (+05:30).
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Formats a UTC instant as an en-IN style IST string,
/// e.g. `25/8/2026, 3:45:12 pm`.
pub fn format_ist(instant: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(offset) => instant
            .with_timezone(&offset)
            .format("%-d/%-m/%Y, %-I:%M:%S %P")
            .to_string(),
        // Unreachable for a constant in-range offset
        None => instant.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_ist() {
        // 2026-08-25 10:15:12 UTC = 15:45:12 IST
        let instant = Utc.with_ymd_and_hms(2026, 8, 25, 10, 15, 12).unwrap();
        assert_eq!(format_ist(instant), "25/8/2026, 3:45:12 pm");
    }

    #[test]
    fn test_format_ist_crosses_midnight() {
        // 2026-01-01 20:00:00 UTC = 01:30:00 IST on Jan 2nd
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(format_ist(instant), "2/1/2026, 1:30:00 am");
    }
}
