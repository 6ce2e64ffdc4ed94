//! HTTP route handlers for the sensor node.
//!
//! Routes are grouped by what the configuration page uses them for.

pub mod pages;
pub mod sensor;
pub mod settings;
pub mod status;

use airnode_protocol::RenderError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tracing::error;

use crate::AppState;

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/`, `/nodemcu.js`, `/nodemcu.css` - Configuration page and form submission
/// - `/settings`, `/aplist` - Form data
/// - `/status` - Status fragment
/// - `/sensor/read` - Latest telemetry
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::routes())
        .merge(settings::routes())
        .merge(status::routes())
        .merge(sensor::routes())
        .with_state(state)
}

/// JSON body with the matching content type.
pub(crate) fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// A render that could not be completed.
pub(crate) struct RenderFailure(pub RenderError);

impl From<RenderError> for RenderFailure {
    fn from(e: RenderError) -> Self {
        Self(e)
    }
}

impl IntoResponse for RenderFailure {
    fn into_response(self) -> Response {
        error!("Render failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Response could not be rendered").into_response()
    }
}
