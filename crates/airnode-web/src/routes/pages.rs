//! Configuration page, its static assets and the form submission.
//!
//! # Endpoints
//!
//! ### `GET /`
//! The configuration page. It loads `/settings` into the form on start.
//!
//! ### `POST /`
//! URL-encoded form submission. Fields are applied to the configuration and
//! saved; the page is served again on success.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{debug, info};

use crate::AppState;

pub const INDEX_HTML: &str = include_str!("../../assets/index.html");
pub const NODEMCU_JS: &str = include_str!("../../assets/nodemcu.js");
pub const NODEMCU_CSS: &str = include_str!("../../assets/nodemcu.css");

/// Create page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/nodemcu.js", get(script))
        .route("/nodemcu.css", get(stylesheet))
}

/// GET /
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /nodemcu.js
async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], NODEMCU_JS)
}

/// GET /nodemcu.css
async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], NODEMCU_CSS)
}

/// POST /
async fn submit(State(state): State<AppState>, Form(fields): Form<Vec<(String, String)>>) -> Response {
    debug!(fields = fields.len(), "Form submitted");
    let mut config = state.config.write().await;

    match config.submit(&fields) {
        Ok(report) => {
            info!(
                rejected = report.rejected.len(),
                truncated = report.truncated.len(),
                "Configuration saved"
            );
            Html(INDEX_HTML).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Settings could not be saved to non-volatile storage. They apply until the next reboot.",
        )
            .into_response(),
    }
}
