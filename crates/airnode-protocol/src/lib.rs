//! # airnode-protocol
//!
//! Payloads exchanged with the web client and publishing collectors.
//!
//! Each render goes into its own bounded [`RenderBuffer`]: JSON for settings
//! and telemetry, an HTML fragment for status.

pub mod buffer;
pub mod settings;
pub mod status;
pub mod telemetry;

pub use buffer::{RenderBuffer, RenderError, PAGE_BUFFER_SIZE};
pub use settings::{
    render_settings, render_station_list, SelectOption, SettingsPayload, POLL_URL, SCAN_ITEM_LIMIT,
};
pub use status::{escape_html, render_status, StatusSnapshot, Uptime};
pub use telemetry::{render_telemetry, TelemetryPayload, NO_MEASUREMENT_CODE};
