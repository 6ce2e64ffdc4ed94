//! `GET /sensor/read` - telemetry for clients using the Poll policy.

use axum::{extract::State, http::StatusCode, response::Response, routing::get, Router};
use chrono::Utc;

use airnode_protocol::{render_telemetry, TelemetryPayload, PAGE_BUFFER_SIZE};

use super::{json_response, RenderFailure};
use crate::AppState;

/// Create sensor routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sensor/read", get(read_sensor))
}

/// GET /sensor/read
///
/// Answers 503 until the sampler has produced a first measurement.
async fn read_sensor(State(state): State<AppState>) -> Result<Response, RenderFailure> {
    let config = state.config.read().await;
    let station_name = config.record().host_name.as_str();

    match state.latest.read().await.as_ref() {
        Some(measurement) => {
            let body = render_telemetry(station_name, measurement)?;
            Ok(json_response(StatusCode::OK, body))
        }
        None => {
            let payload = TelemetryPayload::unavailable(station_name, Utc::now().timestamp());
            let body = airnode_protocol::buffer::render_json(&payload, PAGE_BUFFER_SIZE)?;
            Ok(json_response(StatusCode::SERVICE_UNAVAILABLE, body))
        }
    }
}
