//! Node configuration record.
//!
//! The record is a fixed-shape value: every text field has a compile-time
//! bound and every enumerated field can only hold a legal value. The same
//! record is rendered to the web client, edited through the form and
//! persisted to the non-volatile store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Bounded text stored inline in the record.
///
/// `N` is the maximum number of UTF-8 bytes the field can hold, not
/// characters. Non-ASCII text fits fewer characters than `N`.
pub type Text<const N: usize> = heapless::String<N>;

/// Build a bounded text value, truncating at the last whole character that fits.
pub fn bounded<const N: usize>(value: &str) -> Text<N> {
    let mut out = Text::<N>::new();
    for c in value.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Returns true if `value` would be cut by [`bounded`] with capacity `N`.
pub fn exceeds<const N: usize>(value: &str) -> bool {
    value.len() > N
}

// ============================================================================
// Field bounds
// ============================================================================

pub const SSID_LEN: usize = 19;
pub const PASSWORD_LEN: usize = 19;
pub const STATION_SSID_LEN: usize = 49;
pub const USERNAME_LEN: usize = 19;
pub const URL_LEN: usize = 99;
pub const NTP_POOL_LEN: usize = 49;
pub const HOST_NAME_LEN: usize = 19;

// ============================================================================
// Radio channels
// ============================================================================

/// Number of entries in the 2.4 GHz channel table.
pub const CHANNEL_COUNT: usize = 14;

const CHANNEL_LABELS: [&str; CHANNEL_COUNT] = [
    "1 - 2412 MHz",
    "2 - 2417 MHz",
    "3 - 2422 MHz",
    "4 - 2427 MHz",
    "5 - 2432 MHz",
    "6 - 2437 MHz",
    "7 - 2442 MHz",
    "8 - 2447 MHz",
    "9 - 2452 MHz",
    "10 - 2457 MHz",
    "11 - 2462 MHz",
    "12 - 2467 MHz",
    "13 - 2472 MHz",
    "14 - 2484 MHz",
];

/// Access point channel, stored as an index into the channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    /// Create a channel from a table index (0-13).
    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// All channels in table order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (0..CHANNEL_COUNT as u8).map(Channel)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// IEEE channel number (1-14).
    pub fn number(self) -> u8 {
        self.0 + 1
    }

    /// Centre frequency in MHz. Channel 14 sits apart from the 5 MHz raster.
    pub fn frequency_mhz(self) -> u16 {
        if self.0 == 13 {
            2484
        } else {
            2412 + 5 * self.0 as u16
        }
    }

    /// Display label, e.g. `"6 - 2437 MHz"`.
    pub fn label(self) -> &'static str {
        CHANNEL_LABELS[self.0 as usize]
    }
}

impl TryFrom<u8> for Channel {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Channel::new(index).ok_or_else(|| format!("channel index {} out of range", index))
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> u8 {
        channel.0
    }
}

// ============================================================================
// Publishing policy
// ============================================================================

/// How measurements leave the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublishingPolicy {
    /// The node POSTs each measurement to the configured URL.
    Push,
    /// Clients GET the latest measurement from the node.
    Poll,
}

impl PublishingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishingPolicy::Push => "Push",
            PublishingPolicy::Poll => "Poll",
        }
    }
}

impl fmt::Display for PublishingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a policy literal other than `Push` or `Poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy;

impl FromStr for PublishingPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Push" => Ok(PublishingPolicy::Push),
            "Poll" => Ok(PublishingPolicy::Poll),
            _ => Err(UnknownPolicy),
        }
    }
}

// ============================================================================
// Configuration record
// ============================================================================

/// The node's complete persistent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    /// HTTP port of the embedded web server.
    pub server_port: u16,

    pub access_point_ssid: Text<SSID_LEN>,
    pub access_point_ip: Ipv4Addr,
    /// Host a Wi-Fi network.
    pub access_point_mode: bool,
    pub access_point_password: Text<PASSWORD_LEN>,
    pub access_point_channel: Channel,

    /// Join an existing Wi-Fi network.
    pub station_mode: bool,
    pub station_ssid: Text<STATION_SSID_LEN>,
    /// Passphrase of the network joined in station mode.
    pub station_access_point_password: Text<PASSWORD_LEN>,

    /// Web UI credentials.
    pub station_require_authentication: bool,
    pub station_username: Text<USERNAME_LEN>,
    pub station_password: Text<PASSWORD_LEN>,

    /// Seconds between sensor readings, always > 0.
    pub sensor_sample_interval: u32,
    pub publishing_policy: PublishingPolicy,
    pub publishing_url: Text<URL_LEN>,
    pub publishing_username: Text<USERNAME_LEN>,
    pub publishing_password: Text<PASSWORD_LEN>,

    pub use_ntp: bool,
    pub ntp_pool_url: Text<NTP_POOL_LEN>,
    /// Local time offset from UTC in seconds.
    pub ntp_offset: i32,

    pub host_name: Text<HOST_NAME_LEN>,
}

/// Factory defaults, used on first boot and whenever the store holds no valid record.
pub fn defaults() -> ConfigurationRecord {
    ConfigurationRecord {
        server_port: 80,
        access_point_ssid: bounded("ESP8266"),
        access_point_ip: Ipv4Addr::new(192, 168, 4, 1),
        access_point_mode: true,
        access_point_password: bounded("ESP8266Test"),
        access_point_channel: Channel::default(),
        station_mode: false,
        station_ssid: Text::new(),
        station_access_point_password: Text::new(),
        station_require_authentication: true,
        station_username: bounded("admin"),
        station_password: bounded("admin"),
        sensor_sample_interval: 10,
        publishing_policy: PublishingPolicy::Poll,
        publishing_url: Text::new(),
        publishing_username: Text::new(),
        publishing_password: Text::new(),
        use_ntp: true,
        ntp_pool_url: bounded("nl.pool.ntp.org"),
        ntp_offset: 3600,
        host_name: bounded("NodeMCU"),
    }
}

impl Default for ConfigurationRecord {
    fn default() -> Self {
        defaults()
    }
}
