//! Sensor and radio data consumed by the renderers.
//!
//! The BME680 driver and the Wi-Fi scanner live outside the core. They hand
//! their latest results over through the types and traits in this module.

use serde::{Deserialize, Serialize};

/// Reference sea-level pressure in hPa used for altitude estimates.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = 1013.25;

/// One set of BME680 readings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    pub temperature_c: f32,
    /// Relative humidity in percent.
    pub humidity_pct: f32,
    /// Barometric pressure in hPa.
    pub pressure_hpa: f32,
    /// Gas (VOC) resistance in kΩ.
    pub voc_kohm: f32,
}

impl SensorReading {
    /// Approximate altitude in metres from the barometric formula.
    pub fn approximate_altitude_m(&self) -> f32 {
        44330.0 * (1.0 - (self.pressure_hpa / SEA_LEVEL_PRESSURE_HPA).powf(0.1903))
    }
}

/// A reading together with when it was taken and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub reading: SensorReading,
    /// 0 on success, driver-specific otherwise.
    pub result_code: i32,
    pub result_text: String,
}

impl Measurement {
    pub fn ok(timestamp: i64, reading: SensorReading) -> Self {
        Self {
            timestamp,
            reading,
            result_code: 0,
            result_text: "OK".to_string(),
        }
    }

    pub fn failed(timestamp: i64, result_code: i32, result_text: impl Into<String>) -> Self {
        Self {
            timestamp,
            reading: SensorReading::default(),
            result_code,
            result_text: result_text.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result_code == 0
    }
}

/// A network found by a Wi-Fi scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi: i16,
    pub channel: u8,
    pub secured: bool,
}

/// Source of environmental readings.
pub trait SensorSource: Send {
    /// Take one measurement stamped with `timestamp`.
    fn sample(&mut self, timestamp: i64) -> Measurement;
}

/// Source of Wi-Fi scan results.
pub trait NetworkScanner: Send + Sync {
    fn scan(&self) -> Vec<ScannedNetwork>;
}
