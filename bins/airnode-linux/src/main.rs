mod file_store;
mod publisher;
mod scanner;
mod sensor;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use airnode_core::{ConfigService, NonVolatileStore, SensorSource};
use airnode_web::{create_router, AppState, NodeState};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::file_store::FileStore;
use crate::publisher::Publisher;
use crate::scanner::SimulatedScanner;
use crate::sensor::SimulatedBme680;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,airnode=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("airnode starting...");

    // Configuration
    let store_path = std::env::var("AIRNODE_STORE").unwrap_or_else(|_| "airnode-eeprom.bin".into());
    let bind_host = std::env::var("AIRNODE_BIND").unwrap_or_else(|_| "0.0.0.0".into());

    let store: Box<dyn NonVolatileStore> = Box::new(
        FileStore::open(&store_path).with_context(|| format!("Cannot open store {}", store_path))?,
    );
    let service = ConfigService::boot(store);

    let record = service.record();
    let port = record.server_port;
    let ip_address = if record.access_point_mode {
        record.access_point_ip.to_string()
    } else {
        bind_host.clone()
    };
    let addr: SocketAddr = format!("{}:{}", bind_host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_host, port))?;

    let state: AppState = Arc::new(NodeState::new(
        service,
        Arc::new(SimulatedScanner::new()),
        ip_address,
    ));

    // Spawn sampler
    let sampler_state = state.clone();
    let sampler_handle = tokio::spawn(async move {
        run_sampler(sampler_state, SimulatedBme680::new()).await;
    });

    // Spawn HTTP server
    let http_state = state.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = start_http_server(addr, http_state).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("airnode ready on http://{}", addr);

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = sampler_handle => {
            tracing::warn!("Sampler stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Start the HTTP server
async fn start_http_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Sample the sensor every `sensor_sample_interval` seconds.
///
/// The interval is re-read after every sample so form edits apply without a
/// restart. Publishing failures are logged and sampling continues.
async fn run_sampler(state: AppState, mut sensor: impl SensorSource) {
    let publisher = Publisher::new();

    loop {
        let measurement = sensor.sample(chrono::Utc::now().timestamp());
        if !measurement.is_ok() {
            tracing::warn!(
                code = measurement.result_code,
                "Sensor read failed: {}",
                measurement.result_text
            );
        }
        state.record_measurement(measurement.clone()).await;

        let record = state.config.read().await.record().clone();
        if Publisher::enabled(&record) {
            if let Err(e) = publisher.publish(&record, &measurement).await {
                tracing::warn!("Publishing failed: {:#}", e);
            }
        }

        let interval = u64::from(record.sensor_sample_interval.max(1));
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }
}
