//! Display of timestamps in Indian Standard Time.
//!
//! Rows carry UTC timestamps; everything shown to operators (tables,
//! exports, report ranges) uses IST.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Seconds east of UTC for IST.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The IST offset.
#[must_use]
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// `29 Apr 2025`
#[must_use]
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&ist()).format("%-d %b %Y").to_string()
}

/// `Tue, 29 Apr 2025, 7:53 am`
#[must_use]
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    let local = at.with_timezone(&ist());
    format!(
        "{}, {}",
        local.format("%a, %-d %b %Y"),
        local.format("%-I:%M %P")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats_in_ist() {
        // 02:23 UTC is 07:53 IST
        let at = Utc.with_ymd_and_hms(2025, 4, 29, 2, 23, 0).unwrap();
        assert_eq!(format_datetime(&at), "Tue, 29 Apr 2025, 7:53 am");
        assert_eq!(format_date(&at), "29 Apr 2025");
    }

    #[test]
    fn test_date_rolls_over_at_ist_midnight() {
        let at = Utc.with_ymd_and_hms(2025, 4, 28, 19, 0, 0).unwrap();
        assert_eq!(format_date(&at), "29 Apr 2025");
        assert_eq!(format_datetime(&at), "Tue, 29 Apr 2025, 12:30 am");
    }
}
