//! Settings payload used to populate the configuration form.
//!
//! Key names and their order are part of the contract with the client script.

use serde::Serialize;

use airnode_core::config::{Channel, ConfigurationRecord, PublishingPolicy};
use airnode_core::model::ScannedNetwork;

use crate::buffer::{render_json, RenderError, PAGE_BUFFER_SIZE};

/// Path the client polls for telemetry when the policy is `Poll`.
pub const POLL_URL: &str = "/sensor/read";

/// Most scanned networks offered in the station select.
pub const SCAN_ITEM_LIMIT: usize = 12;

/// Longest SSID allowed by 802.11.
pub const MAX_SSID_LEN: usize = 32;

/// One entry of an HTML select element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// The publishing policy as one flag per choice, for radio buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyFlags {
    #[serde(rename = "Push")]
    pub push: bool,
    #[serde(rename = "Poll")]
    pub poll: bool,
}

impl From<PublishingPolicy> for PolicyFlags {
    fn from(policy: PublishingPolicy) -> Self {
        Self {
            push: policy == PublishingPolicy::Push,
            poll: policy == PublishingPolicy::Poll,
        }
    }
}

/// Form data sent by `GET /settings`.
#[derive(Debug, Serialize)]
pub struct SettingsPayload<'a> {
    #[serde(rename = "accessPointMode")]
    pub access_point_mode: bool,
    #[serde(rename = "accessPointSSID")]
    pub access_point_ssid: &'a str,
    #[serde(rename = "accessPointPassword")]
    pub access_point_password: &'a str,
    #[serde(rename = "accessPointIPAddress")]
    pub access_point_ip_address: String,
    #[serde(rename = "stationMode")]
    pub station_mode: bool,
    #[serde(rename = "accessPointList")]
    pub access_point_list: Vec<SelectOption>,
    #[serde(rename = "stationPassword")]
    pub station_password: &'a str,
    #[serde(rename = "requireAuthentication")]
    pub require_authentication: bool,
    #[serde(rename = "authenticationUsername")]
    pub authentication_username: &'a str,
    #[serde(rename = "authenticationPassword")]
    pub authentication_password: &'a str,
    #[serde(rename = "sampleInterval")]
    pub sample_interval: u32,
    #[serde(rename = "publishURL")]
    pub publish_url: &'a str,
    #[serde(rename = "publishingUsername")]
    pub publishing_username: &'a str,
    #[serde(rename = "publishingPassword")]
    pub publishing_password: &'a str,
    #[serde(rename = "pollURL")]
    pub poll_url: &'static str,
    #[serde(rename = "publishingPolicy")]
    pub publishing_policy: PolicyFlags,
    #[serde(rename = "stationHostname")]
    pub station_hostname: &'a str,
    #[serde(rename = "channelList")]
    pub channel_list: Vec<SelectOption>,
    #[serde(rename = "useNTP")]
    pub use_ntp: bool,
    #[serde(rename = "NTPOffset")]
    pub ntp_offset: i32,
    #[serde(rename = "NTPPoolURL")]
    pub ntp_pool_url: &'a str,
    #[serde(rename = "serverPort")]
    pub server_port: u16,
}

impl<'a> SettingsPayload<'a> {
    pub fn new(record: &'a ConfigurationRecord, networks: &[ScannedNetwork]) -> Self {
        Self {
            access_point_mode: record.access_point_mode,
            access_point_ssid: &record.access_point_ssid,
            access_point_password: &record.access_point_password,
            access_point_ip_address: record.access_point_ip.to_string(),
            station_mode: record.station_mode,
            access_point_list: station_options(&record.station_ssid, networks),
            station_password: &record.station_access_point_password,
            require_authentication: record.station_require_authentication,
            authentication_username: &record.station_username,
            authentication_password: &record.station_password,
            sample_interval: record.sensor_sample_interval,
            publish_url: &record.publishing_url,
            publishing_username: &record.publishing_username,
            publishing_password: &record.publishing_password,
            poll_url: POLL_URL,
            publishing_policy: record.publishing_policy.into(),
            station_hostname: &record.host_name,
            channel_list: channel_options(record.access_point_channel),
            use_ntp: record.use_ntp,
            ntp_offset: record.ntp_offset,
            ntp_pool_url: &record.ntp_pool_url,
            server_port: record.server_port,
        }
    }
}

/// Payload of `GET /aplist`.
#[derive(Debug, Serialize)]
pub struct StationListPayload {
    #[serde(rename = "accessPointList")]
    pub access_point_list: Vec<SelectOption>,
}

/// Options for the station SSID select.
///
/// Networks are listed strongest first with duplicates and hidden networks
/// dropped, keeping at most [`SCAN_ITEM_LIMIT`]. A non-empty `stored` SSID is
/// always offered and selected, even when the scan did not find it or it fell
/// past the limit.
pub fn station_options(stored: &str, networks: &[ScannedNetwork]) -> Vec<SelectOption> {
    let mut sorted: Vec<&ScannedNetwork> = networks
        .iter()
        .filter(|n| !n.ssid.is_empty() && n.ssid.len() <= MAX_SSID_LEN)
        .collect();
    sorted.sort_by(|a, b| b.rssi.cmp(&a.rssi));

    let mut options: Vec<SelectOption> = Vec::with_capacity(sorted.len() + 1);
    for network in sorted {
        if options.iter().any(|o| o.value == network.ssid) {
            continue;
        }
        options.push(SelectOption {
            value: network.ssid.clone(),
            text: format!("{} ({} dBm)", network.ssid, network.rssi),
            selected: network.ssid == stored,
        });
    }

    let stored_option = match options.iter().position(|o| o.selected) {
        Some(pos) if pos >= SCAN_ITEM_LIMIT => Some(options.remove(pos)),
        Some(_) => None,
        None if !stored.is_empty() => Some(SelectOption {
            value: stored.to_string(),
            text: stored.to_string(),
            selected: true,
        }),
        None => None,
    };

    options.truncate(SCAN_ITEM_LIMIT);
    if let Some(option) = stored_option {
        options.insert(0, option);
    }
    options
}

/// The 14 channel options with `current` selected.
pub fn channel_options(current: Channel) -> Vec<SelectOption> {
    Channel::all()
        .map(|channel| SelectOption {
            value: channel.index().to_string(),
            text: channel.label().to_string(),
            selected: channel == current,
        })
        .collect()
}

/// Render the settings payload for `record`.
pub fn render_settings(
    record: &ConfigurationRecord,
    networks: &[ScannedNetwork],
) -> Result<String, RenderError> {
    render_json(&SettingsPayload::new(record, networks), PAGE_BUFFER_SIZE)
}

/// Render the station list payload.
pub fn render_station_list(
    stored: &str,
    networks: &[ScannedNetwork],
) -> Result<String, RenderError> {
    let payload = StationListPayload {
        access_point_list: station_options(stored, networks),
    };
    render_json(&payload, PAGE_BUFFER_SIZE)
}
