//! Publish-time parsing and AWST display formatting.

use chrono::{DateTime, FixedOffset, Utc};

/// Australian Western Standard Time, UTC+8 with no daylight saving.
const AWST_OFFSET_SECS: i32 = 8 * 3600;

/// Rendered in place of both date and time when the source instant is unusable.
pub const INVALID_TIME: &str = "Invalid Date";

/// Date and time display strings in AWST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTime {
    /// `dd/mm/yyyy`
    pub date: String,
    /// `hh:mm AM` / `hh:mm PM`
    pub time: String,
}

impl LocalTime {
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            date: INVALID_TIME.to_string(),
            time: INVALID_TIME.to_string(),
        }
    }

    /// The `"<time>, <date>"` string stored alongside each incident.
    #[must_use]
    pub fn time_reported(&self) -> String {
        format!("{}, {}", self.time, self.date)
    }
}

/// Parses a feed timestamp into an absolute instant.
///
/// Accepts RFC 2822 (`pubDate`) and RFC 3339 (Atom). Timestamps without an
/// explicit offset are rejected rather than guessed in the host zone.
#[must_use]
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Renders an instant as AWST date and 12-hour time strings.
#[must_use]
pub fn format_local_time(instant: &DateTime<Utc>) -> LocalTime {
    let Some(awst) = FixedOffset::east_opt(AWST_OFFSET_SECS) else {
        return LocalTime::invalid();
    };
    let local = instant.with_timezone(&awst);
    LocalTime {
        date: local.format("%d/%m/%Y").to_string(),
        time: local.format("%I:%M %p").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        parse_published(raw).expect("test timestamp should parse")
    }

    #[test]
    fn rfc3339_utc_converts_to_awst() {
        let local = format_local_time(&utc("2024-06-01T04:30:00Z"));
        assert_eq!(local.date, "01/06/2024");
        assert_eq!(local.time, "12:30 PM");
    }

    #[test]
    fn rfc2822_pubdate_converts_to_awst() {
        let local = format_local_time(&utc("Sat, 01 Jun 2024 04:30:00 GMT"));
        assert_eq!(local.date, "01/06/2024");
        assert_eq!(local.time, "12:30 PM");
    }

    #[test]
    fn foreign_offset_is_normalized_before_conversion() {
        // 23:15 on 31 May in UTC-5 is 04:15 UTC on 1 June, 12:15 PM AWST.
        let local = format_local_time(&utc("2024-05-31T23:15:00-05:00"));
        assert_eq!(local.date, "01/06/2024");
        assert_eq!(local.time, "12:15 PM");
    }

    #[test]
    fn conversion_can_cross_midnight() {
        let local = format_local_time(&utc("2024-12-31T17:05:00Z"));
        assert_eq!(local.date, "01/01/2025");
        assert_eq!(local.time, "01:05 AM");
    }

    #[test]
    fn midnight_renders_as_twelve_am() {
        let local = format_local_time(&utc("2024-06-01T16:00:00Z"));
        assert_eq!(local.time, "12:00 AM");
        assert_eq!(local.date, "02/06/2024");
    }

    #[test]
    fn naive_timestamp_is_rejected() {
        assert!(parse_published("2024-06-01 04:30:00").is_none());
        assert!(parse_published("2024-06-01T04:30:00").is_none());
    }

    #[test]
    fn garbage_and_blank_are_rejected() {
        assert!(parse_published("").is_none());
        assert!(parse_published("yesterday-ish").is_none());
    }

    #[test]
    fn time_reported_is_time_then_date() {
        let local = format_local_time(&utc("2024-06-01T04:30:00Z"));
        assert_eq!(local.time_reported(), "12:30 PM, 01/06/2024");
        assert_eq!(
            LocalTime::invalid().time_reported(),
            "Invalid Date, Invalid Date"
        );
    }
}
