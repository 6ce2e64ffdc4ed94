//! Telemetry payload served on `GET /sensor/read` and pushed to collectors.

use serde::Serialize;

use airnode_core::model::Measurement;

use crate::buffer::{render_json, RenderError, PAGE_BUFFER_SIZE};

/// Result code reported when no measurement has been taken yet.
pub const NO_MEASUREMENT_CODE: i32 = -1;

/// One measurement as sent to clients.
///
/// Readings are `None` when they are not finite, which serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryPayload<'a> {
    #[serde(rename = "stationName")]
    pub station_name: &'a str,
    pub timestamp: i64,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    #[serde(rename = "air-pressure")]
    pub air_pressure: Option<f32>,
    pub voc: Option<f32>,
    #[serde(rename = "resultCode")]
    pub result_code: i32,
    #[serde(rename = "resultText")]
    pub result_text: &'a str,
}

fn finite(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}

impl<'a> TelemetryPayload<'a> {
    pub fn new(station_name: &'a str, measurement: &'a Measurement) -> Self {
        let reading = &measurement.reading;
        Self {
            station_name,
            timestamp: measurement.timestamp,
            temperature: finite(reading.temperature_c),
            humidity: finite(reading.humidity_pct),
            air_pressure: finite(reading.pressure_hpa),
            voc: finite(reading.voc_kohm),
            result_code: measurement.result_code,
            result_text: &measurement.result_text,
        }
    }

    /// Payload for a node that has not sampled yet.
    pub fn unavailable(station_name: &'a str, timestamp: i64) -> Self {
        Self {
            station_name,
            timestamp,
            temperature: None,
            humidity: None,
            air_pressure: None,
            voc: None,
            result_code: NO_MEASUREMENT_CODE,
            result_text: "No measurement available",
        }
    }
}

/// Render the telemetry payload for `measurement`.
pub fn render_telemetry(station_name: &str, measurement: &Measurement) -> Result<String, RenderError> {
    render_json(&TelemetryPayload::new(station_name, measurement), PAGE_BUFFER_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use airnode_core::model::SensorReading;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn measurement() -> Measurement {
        Measurement::ok(
            1_700_000_000,
            SensorReading {
                temperature_c: 21.5,
                humidity_pct: 40.0,
                pressure_hpa: 1013.25,
                voc_kohm: 12.5,
            },
        )
    }

    #[test]
    fn test_telemetry_payload() {
        let json = render_telemetry("NodeMCU", &measurement()).unwrap();
        assert_eq!(
            json,
            r#"{"stationName":"NodeMCU","timestamp":1700000000,"temperature":21.5,"humidity":40.0,"air-pressure":1013.25,"voc":12.5,"resultCode":0,"resultText":"OK"}"#
        );
    }

    #[test]
    fn test_result_text_is_a_key() {
        let failed = Measurement::failed(5, 2, "sensor \"BME680\" not found");
        let value: Value = serde_json::from_str(&render_telemetry("node", &failed).unwrap()).unwrap();
        assert_eq!(value["resultCode"], 2);
        assert_eq!(value["resultText"], "sensor \"BME680\" not found");
    }

    #[test]
    fn test_always_valid_json() {
        let names = ["plain", "quo\"te", "back\\slash", "ctl\u{1}\n\t", ""];
        let values = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0, 1e30];

        for name in names {
            for value in values {
                let mut m = measurement();
                m.reading.temperature_c = value;
                m.result_text = name.to_string();

                let json = render_telemetry(name, &m).unwrap();
                let parsed: Value = serde_json::from_str(&json).unwrap();
                assert_eq!(parsed["stationName"], name);
                assert_eq!(parsed["resultText"], name);
                if !value.is_finite() {
                    assert!(parsed["temperature"].is_null());
                }
            }
        }
    }

    #[test]
    fn test_unavailable() {
        let payload = TelemetryPayload::unavailable("NodeMCU", 42);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["resultCode"], -1);
        assert!(value["temperature"].is_null());
    }
}
