//! Wall-clock strings shown on the status page.

use chrono::{DateTime, Duration, Utc};

use airnode_core::ConfigurationRecord;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local offset from UTC, applied only when NTP time is in use.
fn local_offset(record: &ConfigurationRecord) -> Duration {
    if record.use_ntp {
        Duration::seconds(i64::from(record.ntp_offset))
    } else {
        Duration::zero()
    }
}

pub fn format_time(at: DateTime<Utc>, record: &ConfigurationRecord) -> String {
    (at + local_offset(record)).format(TIME_FORMAT).to_string()
}

/// Current system time in the node's local zone.
pub fn system_time(record: &ConfigurationRecord) -> String {
    format_time(Utc::now(), record)
}

/// Format a unix timestamp, or `"never"` when out of range.
pub fn format_timestamp(timestamp: i64, record: &ConfigurationRecord) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(at) => format_time(at, record),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airnode_core::defaults;

    #[test]
    fn test_offset_applied_with_ntp() {
        let record = defaults();
        assert_eq!(format_timestamp(0, &record), "1970-01-01 01:00:00");
    }

    #[test]
    fn test_offset_ignored_without_ntp() {
        let mut record = defaults();
        record.use_ntp = false;
        assert_eq!(format_timestamp(1_700_000_000, &record), "2023-11-14 22:13:20");
    }
}
