//! Form data routes.
//!
//! # Endpoints
//!
//! ### `GET /settings`
//! The stored configuration in the shape the page's form loader expects.
//!
//! ### `GET /aplist`
//! Rescan and return only the station select options.

use axum::{extract::State, http::StatusCode, response::Response, routing::get, Router};
use tracing::debug;

use airnode_protocol::{render_settings, render_station_list};

use super::{json_response, RenderFailure};
use crate::AppState;

/// Create settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/aplist", get(get_station_list))
}

/// GET /settings
async fn get_settings(State(state): State<AppState>) -> Result<Response, RenderFailure> {
    let networks = state.scanner.scan();
    let config = state.config.read().await;
    let body = render_settings(config.record(), &networks)?;
    debug!(bytes = body.len(), "Rendered settings");
    Ok(json_response(StatusCode::OK, body))
}

/// GET /aplist
async fn get_station_list(State(state): State<AppState>) -> Result<Response, RenderFailure> {
    let networks = state.scanner.scan();
    let config = state.config.read().await;
    let body = render_station_list(&config.record().station_ssid, &networks)?;
    debug!(networks = networks.len(), "Rendered station list");
    Ok(json_response(StatusCode::OK, body))
}
