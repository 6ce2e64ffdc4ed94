//! Merging a web form submission into the configuration record.
//!
//! The HTTP layer decodes the URL-encoded body into name/value pairs; this
//! module validates each field on its own and merges the accepted ones.
//!
//! # Rules
//!
//! - Checkboxes are true when their name is present at all, false when absent.
//! - Text is copied and truncated to the field bound.
//! - IP, channel, policy and numeric fields that fail to parse keep their
//!   previous value and are listed in [`FormReport::rejected`].
//! - Any other absent field keeps its previous value.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::config::{bounded, exceeds, Channel, ConfigurationRecord, PublishingPolicy, Text};

// Form field names, as used by the configuration page.
pub const ACCESS_POINT_MODE: &str = "accessPointMode";
pub const ACCESS_POINT_SSID: &str = "accessPointSSID";
pub const ACCESS_POINT_PASSWORD: &str = "accessPointPassword";
pub const ACCESS_POINT_IP_ADDRESS: &str = "accessPointIPAddress";
pub const CHANNEL_LIST: &str = "channelList";
pub const STATION_MODE: &str = "stationMode";
pub const ACCESS_POINT_LIST: &str = "accessPointList";
pub const STATION_PASSWORD: &str = "stationPassword";
pub const STATION_HOSTNAME: &str = "stationHostname";
pub const REQUIRE_AUTHENTICATION: &str = "requireAuthentication";
pub const AUTHENTICATION_USERNAME: &str = "authenticationUsername";
pub const AUTHENTICATION_PASSWORD: &str = "authenticationPassword";
pub const SERVER_PORT: &str = "serverPort";
pub const SAMPLE_INTERVAL: &str = "sampleInterval";
pub const PUBLISHING_POLICY: &str = "publishingPolicy";
pub const PUBLISH_URL: &str = "publishURL";
pub const PUBLISHING_USERNAME: &str = "publishingUsername";
pub const PUBLISHING_PASSWORD: &str = "publishingPassword";
pub const USE_NTP: &str = "useNTP";
pub const NTP_OFFSET: &str = "NTPOffset";
pub const NTP_POOL_URL: &str = "NTPPoolURL";

/// A single field that failed validation. The record keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field}: '{value}' is not a dotted-quad IPv4 address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field}: {value} is out of range")]
    OutOfRange { field: &'static str, value: String },

    #[error("{field}: unknown publishing policy '{value}'")]
    UnknownPolicy { field: &'static str, value: String },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::InvalidAddress { field, .. }
            | FieldError::InvalidNumber { field, .. }
            | FieldError::OutOfRange { field, .. }
            | FieldError::UnknownPolicy { field, .. } => field,
        }
    }
}

/// Outcome of applying a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormReport {
    /// Fields that kept their previous value.
    pub rejected: Vec<FieldError>,
    /// Text fields that were cut to their bound.
    pub truncated: Vec<&'static str>,
}

impl FormReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.truncated.is_empty()
    }
}

/// Merge `fields` into `record`.
///
/// The merge works on a copy that replaces `record` only once every field
/// has been processed. Repeated names resolve to the last occurrence.
pub fn apply_form<K, V>(record: &mut ConfigurationRecord, fields: &[(K, V)]) -> FormReport
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let values: HashMap<&str, &str> = fields
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();

    let mut merged = record.clone();
    let mut report = FormReport::default();

    // Checkboxes
    merged.access_point_mode = values.contains_key(ACCESS_POINT_MODE);
    merged.station_mode = values.contains_key(STATION_MODE);
    merged.station_require_authentication = values.contains_key(REQUIRE_AUTHENTICATION);
    merged.use_ntp = values.contains_key(USE_NTP);

    // Text
    copy_text(&mut merged.access_point_ssid, &values, ACCESS_POINT_SSID, &mut report);
    copy_text(&mut merged.access_point_password, &values, ACCESS_POINT_PASSWORD, &mut report);
    copy_text(&mut merged.station_ssid, &values, ACCESS_POINT_LIST, &mut report);
    copy_text(&mut merged.station_access_point_password, &values, STATION_PASSWORD, &mut report);
    copy_text(&mut merged.host_name, &values, STATION_HOSTNAME, &mut report);
    copy_text(&mut merged.station_username, &values, AUTHENTICATION_USERNAME, &mut report);
    copy_text(&mut merged.station_password, &values, AUTHENTICATION_PASSWORD, &mut report);
    copy_text(&mut merged.publishing_url, &values, PUBLISH_URL, &mut report);
    copy_text(&mut merged.publishing_username, &values, PUBLISHING_USERNAME, &mut report);
    copy_text(&mut merged.publishing_password, &values, PUBLISHING_PASSWORD, &mut report);
    copy_text(&mut merged.ntp_pool_url, &values, NTP_POOL_URL, &mut report);

    // Parsed fields
    if let Some(value) = values.get(ACCESS_POINT_IP_ADDRESS) {
        match value.trim().parse::<Ipv4Addr>() {
            Ok(ip) => merged.access_point_ip = ip,
            Err(_) => report.rejected.push(FieldError::InvalidAddress {
                field: ACCESS_POINT_IP_ADDRESS,
                value: value.to_string(),
            }),
        }
    }

    if let Some(value) = values.get(CHANNEL_LIST) {
        match parse_int::<u8>(CHANNEL_LIST, value)
            .and_then(|index| Channel::new(index).ok_or_else(|| out_of_range(CHANNEL_LIST, value)))
        {
            Ok(channel) => merged.access_point_channel = channel,
            Err(e) => report.rejected.push(e),
        }
    }

    if let Some(value) = values.get(PUBLISHING_POLICY) {
        match value.parse::<PublishingPolicy>() {
            Ok(policy) => merged.publishing_policy = policy,
            Err(_) => report.rejected.push(FieldError::UnknownPolicy {
                field: PUBLISHING_POLICY,
                value: value.to_string(),
            }),
        }
    }

    if let Some(value) = values.get(SERVER_PORT) {
        match parse_int::<u16>(SERVER_PORT, value) {
            Ok(port) => merged.server_port = port,
            Err(e) => report.rejected.push(e),
        }
    }

    if let Some(value) = values.get(SAMPLE_INTERVAL) {
        match parse_int::<u32>(SAMPLE_INTERVAL, value) {
            Ok(0) => report.rejected.push(out_of_range(SAMPLE_INTERVAL, value)),
            Ok(interval) => merged.sensor_sample_interval = interval,
            Err(e) => report.rejected.push(e),
        }
    }

    if let Some(value) = values.get(NTP_OFFSET) {
        match parse_int::<i32>(NTP_OFFSET, value) {
            Ok(offset) => merged.ntp_offset = offset,
            Err(e) => report.rejected.push(e),
        }
    }

    *record = merged;
    report
}

fn copy_text<const N: usize>(
    target: &mut Text<N>,
    values: &HashMap<&str, &str>,
    name: &'static str,
    report: &mut FormReport,
) {
    if let Some(value) = values.get(name) {
        if exceeds::<N>(value) {
            report.truncated.push(name);
        }
        *target = bounded(value);
    }
}

fn out_of_range(field: &'static str, value: &str) -> FieldError {
    FieldError::OutOfRange {
        field,
        value: value.to_string(),
    }
}

/// Parse an integer, telling malformed input apart from out-of-range input.
fn parse_int<T>(field: &'static str, value: &str) -> Result<T, FieldError>
where
    T: TryFrom<i64>,
{
    let trimmed = value.trim();
    let wide: i64 = trimmed.parse().map_err(|_| {
        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            out_of_range(field, value)
        } else {
            FieldError::InvalidNumber {
                field,
                value: value.to_string(),
            }
        }
    })?;
    T::try_from(wide).map_err(|_| out_of_range(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;
    use pretty_assertions::assert_eq;

    fn all_checked() -> Vec<(&'static str, &'static str)> {
        vec![
            (ACCESS_POINT_MODE, "on"),
            (STATION_MODE, "on"),
            (REQUIRE_AUTHENTICATION, "on"),
            (USE_NTP, "on"),
        ]
    }

    #[test]
    fn test_omitted_checkbox_is_false() {
        let mut record = defaults();
        assert!(record.access_point_mode);

        let report = apply_form(&mut record, &[(STATION_MODE, "on")]);
        assert!(report.is_clean());
        assert!(!record.access_point_mode);
        assert!(record.station_mode);
        assert!(!record.station_require_authentication);
        assert!(!record.use_ntp);
    }

    #[test]
    fn test_checkbox_value_is_irrelevant() {
        let mut record = defaults();
        apply_form(&mut record, &[(ACCESS_POINT_MODE, "")]);
        assert!(record.access_point_mode);
    }

    #[test]
    fn test_text_fields_copied() {
        let mut record = defaults();
        let mut fields = all_checked();
        fields.extend([
            (ACCESS_POINT_SSID, "airnode"),
            (ACCESS_POINT_LIST, "HomeNetwork"),
            (STATION_PASSWORD, "wifi-pass"),
            (STATION_HOSTNAME, "greenhouse"),
            (AUTHENTICATION_USERNAME, "operator"),
            (PUBLISH_URL, "http://collector.local/post"),
            (NTP_POOL_URL, "pool.ntp.org"),
        ]);

        let report = apply_form(&mut record, &fields);
        assert!(report.is_clean());
        assert_eq!(record.access_point_ssid.as_str(), "airnode");
        assert_eq!(record.station_ssid.as_str(), "HomeNetwork");
        assert_eq!(record.station_access_point_password.as_str(), "wifi-pass");
        assert_eq!(record.host_name.as_str(), "greenhouse");
        assert_eq!(record.station_username.as_str(), "operator");
        assert_eq!(record.publishing_url.as_str(), "http://collector.local/post");
        assert_eq!(record.ntp_pool_url.as_str(), "pool.ntp.org");
        // Absent text stays unchanged
        assert_eq!(record.station_password.as_str(), "admin");
    }

    #[test]
    fn test_long_ssid_truncated() {
        let mut record = defaults();
        let long = "S".repeat(60);

        let report = apply_form(&mut record, &[(ACCESS_POINT_SSID, long.as_str())]);
        assert_eq!(record.access_point_ssid.len(), 19);
        assert_eq!(record.access_point_ssid.as_str(), "S".repeat(19));
        assert_eq!(report.truncated, vec![ACCESS_POINT_SSID]);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_ip_address() {
        let mut record = defaults();
        apply_form(&mut record, &[(ACCESS_POINT_IP_ADDRESS, "10.1.2.3")]);
        assert_eq!(record.access_point_ip.octets(), [10, 1, 2, 3]);

        let report = apply_form(&mut record, &[(ACCESS_POINT_IP_ADDRESS, "not.an.ip")]);
        assert_eq!(record.access_point_ip.octets(), [10, 1, 2, 3]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].field(), ACCESS_POINT_IP_ADDRESS);
    }

    #[test]
    fn test_ip_round_trip() {
        let mut record = defaults();
        let rendered = record.access_point_ip.to_string();
        assert_eq!(rendered, "192.168.4.1");

        apply_form(&mut record, &[(ACCESS_POINT_IP_ADDRESS, rendered.as_str())]);
        assert_eq!(record.access_point_ip.octets(), [192, 168, 4, 1]);
    }

    #[test]
    fn test_policy() {
        let mut record = defaults();
        apply_form(&mut record, &[(PUBLISHING_POLICY, "Push")]);
        assert_eq!(record.publishing_policy, PublishingPolicy::Push);

        let report = apply_form(&mut record, &[(PUBLISHING_POLICY, "Broadcast")]);
        assert_eq!(record.publishing_policy, PublishingPolicy::Push);
        assert!(matches!(
            report.rejected[0],
            FieldError::UnknownPolicy { .. }
        ));
    }

    #[test]
    fn test_numeric_fields() {
        let mut record = defaults();
        let report = apply_form(
            &mut record,
            &[
                (SERVER_PORT, "8080"),
                (SAMPLE_INTERVAL, " 60 "),
                (NTP_OFFSET, "-3600"),
                (CHANNEL_LIST, "5"),
            ],
        );
        assert!(report.is_clean());
        assert_eq!(record.server_port, 8080);
        assert_eq!(record.sensor_sample_interval, 60);
        assert_eq!(record.ntp_offset, -3600);
        assert_eq!(record.access_point_channel.number(), 6);
    }

    #[test]
    fn test_invalid_numbers_keep_previous_values() {
        let mut record = defaults();
        let report = apply_form(
            &mut record,
            &[
                (SERVER_PORT, "70000"),
                (SAMPLE_INTERVAL, "0"),
                (NTP_OFFSET, "soon"),
                (CHANNEL_LIST, "14"),
            ],
        );

        assert_eq!(record.server_port, 80);
        assert_eq!(record.sensor_sample_interval, 10);
        assert_eq!(record.ntp_offset, 3600);
        assert_eq!(record.access_point_channel.index(), 0);

        let fields: Vec<_> = report.rejected.iter().map(FieldError::field).collect();
        assert_eq!(fields.len(), 4);
        assert!(matches!(
            report
                .rejected
                .iter()
                .find(|e| e.field() == SERVER_PORT),
            Some(FieldError::OutOfRange { .. })
        ));
        assert!(matches!(
            report.rejected.iter().find(|e| e.field() == NTP_OFFSET),
            Some(FieldError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_partial_failure_saves_valid_fields() {
        let mut record = defaults();
        let report = apply_form(
            &mut record,
            &[
                (ACCESS_POINT_MODE, "on"),
                (SERVER_PORT, "abc"),
                (STATION_HOSTNAME, "lab-node"),
            ],
        );
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(record.server_port, 80);
        assert_eq!(record.host_name.as_str(), "lab-node");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let mut record = defaults();
        apply_form(
            &mut record,
            &[(STATION_HOSTNAME, "first"), (STATION_HOSTNAME, "second")],
        );
        assert_eq!(record.host_name.as_str(), "second");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut record = defaults();
        let mut fields = all_checked();
        fields.extend([("scan", "Scan"), ("pollURL", "/elsewhere")]);

        let report = apply_form(&mut record, &fields);
        assert!(report.is_clean());
        let expected = ConfigurationRecord {
            station_mode: true,
            ..defaults()
        };
        assert_eq!(record, expected);
    }
}
