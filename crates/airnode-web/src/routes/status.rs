//! `GET /status` - the fragment shown on the page's Status tab.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tracing::debug;

use airnode_core::SensorReading;
use airnode_protocol::{render_status, StatusSnapshot, Uptime};

use super::RenderFailure;
use crate::{clock, AppState};

/// Create status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}

/// GET /status
async fn get_status(State(state): State<AppState>) -> Result<impl IntoResponse, RenderFailure> {
    let config = state.config.read().await;
    let latest = state.latest.read().await;
    let record = config.record();

    let (last_measurement, reading) = match latest.as_ref() {
        Some(m) => (clock::format_timestamp(m.timestamp, record), m.reading),
        None => ("never".to_string(), SensorReading::default()),
    };
    let system_time = clock::system_time(record);

    let snapshot = StatusSnapshot {
        uptime: Uptime::from_secs(state.uptime_secs()),
        system_time: &system_time,
        last_measurement: &last_measurement,
        node_name: &record.host_name,
        ip_address: &state.ip_address,
        reading,
    };
    let body = render_status(&snapshot)?;
    debug!(bytes = body.len(), "Rendered status");
    Ok(Html(body))
}
