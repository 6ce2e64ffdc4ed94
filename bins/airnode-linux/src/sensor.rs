//! Simulated BME680 producing slowly drifting readings.

use std::time::Instant;

use airnode_core::{Measurement, SensorReading, SensorSource};

pub struct SimulatedBme680 {
    started: Instant,
}

impl SimulatedBme680 {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl SensorSource for SimulatedBme680 {
    fn sample(&mut self, timestamp: i64) -> Measurement {
        let t = self.started.elapsed().as_secs_f32() / 60.0;
        Measurement::ok(
            timestamp,
            SensorReading {
                temperature_c: 21.0 + t.sin() * 2.5,
                humidity_pct: 45.0 + t.cos() * 8.0,
                pressure_hpa: 1013.25 + (t * 0.3).sin() * 4.0,
                voc_kohm: 50.0 + (t * 0.7).cos() * 15.0,
            },
        )
    }
}
