//! Fixed Wi-Fi scan results for running without a radio.

use airnode_core::{NetworkScanner, ScannedNetwork};

pub struct SimulatedScanner {
    networks: Vec<ScannedNetwork>,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        let network = |ssid: &str, rssi, channel, secured| ScannedNetwork {
            ssid: ssid.to_string(),
            rssi,
            channel,
            secured,
        };
        Self {
            networks: vec![
                network("HomeNetwork", -48, 6, true),
                network("Workshop", -67, 1, true),
                network("GuestWiFi", -74, 11, false),
            ],
        }
    }
}

impl NetworkScanner for SimulatedScanner {
    fn scan(&self) -> Vec<ScannedNetwork> {
        self.networks.clone()
    }
}
