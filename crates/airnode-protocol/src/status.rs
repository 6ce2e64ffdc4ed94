//! Human-readable status fragment shown on the Status tab.

use std::fmt::{self, Write};

use airnode_core::model::SensorReading;

use crate::buffer::{RenderBuffer, RenderError, PAGE_BUFFER_SIZE};

/// Time since boot split into whole days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Uptime {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            days: secs / 86400,
            hours: (secs % 86400) / 3600,
            minutes: (secs % 3600) / 60,
            seconds: secs % 60,
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days {} hours {} minutes {} seconds",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Everything the status fragment displays.
#[derive(Debug, Clone)]
pub struct StatusSnapshot<'a> {
    pub uptime: Uptime,
    pub system_time: &'a str,
    pub last_measurement: &'a str,
    pub node_name: &'a str,
    pub ip_address: &'a str,
    pub reading: SensorReading,
}

/// Writes `text` with HTML special characters replaced by entities.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            f.write_str(match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

/// Escape `text` for use in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    Escaped(text).to_string()
}

fn row(buffer: &mut RenderBuffer, label: &str, value: fmt::Arguments<'_>) -> fmt::Result {
    write!(buffer, " <tr>\n   <td>{}</td>\n   <td>{}</td>\n </tr>\n", label, value)
}

fn write_status(buffer: &mut RenderBuffer, snapshot: &StatusSnapshot<'_>) -> fmt::Result {
    let reading = &snapshot.reading;
    buffer.write_str("<table>\n")?;
    row(buffer, "Up-time:", format_args!("{}", snapshot.uptime))?;
    row(buffer, "System time:", format_args!("{}", Escaped(snapshot.system_time)))?;
    row(buffer, "Last measurement:", format_args!("{}", Escaped(snapshot.last_measurement)))?;
    row(buffer, "Node name:", format_args!("{}", Escaped(snapshot.node_name)))?;
    row(buffer, "IP address:", format_args!("{}", Escaped(snapshot.ip_address)))?;
    row(buffer, "Temperature:", format_args!("{:.6} &#176;C", reading.temperature_c))?;
    row(buffer, "Humidity:", format_args!("{:.6} &#37;", reading.humidity_pct))?;
    row(buffer, "Air pressure:", format_args!("{:.6} hPa", reading.pressure_hpa))?;
    // Zeroed readings before the first sample have no meaningful altitude
    if reading.pressure_hpa > 0.0 {
        row(buffer, "Altitude:", format_args!("{:.1} m", reading.approximate_altitude_m()))?;
    } else {
        row(buffer, "Altitude:", format_args!("-"))?;
    }
    row(buffer, "VOC:", format_args!("{:.6} k&#937;", reading.voc_kohm))?;
    buffer.write_str("</table>\n")
}

/// Render the status table.
pub fn render_status(snapshot: &StatusSnapshot<'_>) -> Result<String, RenderError> {
    let mut buffer = RenderBuffer::with_capacity(PAGE_BUFFER_SIZE);
    // The buffer is the only writer that can fail
    match write_status(&mut buffer, snapshot) {
        Ok(()) => buffer.into_string(),
        Err(fmt::Error) => Err(RenderError::BufferOverflow {
            capacity: buffer.capacity(),
        }),
    }
}
