//! Route handlers.

use super::AppState;
use crate::metrics as service_metrics;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

const PEM_CONTENT_TYPE: &str = "application/x-pem-file";
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Token responses, successful or not, must not be cached.
const NO_STORE: [(axum::http::HeaderName, &str); 2] =
    [(CACHE_CONTROL, "no-store"), (PRAGMA, "no-cache")];

/// `POST /token`
pub async fn token(State(state): State<AppState>, body: Bytes) -> Response {
    match state.service.handle(&body).await {
        Ok(response) => (StatusCode::OK, NO_STORE, Json(response)).into_response(),
        Err(e) => (NO_STORE, e).into_response(),
    }
}

/// `GET /public-key`: SPKI PEM of the signing key.
pub async fn public_key(State(state): State<AppState>) -> Response {
    match state.service.keys().public_key_pem() {
        Ok(pem) => ([(CONTENT_TYPE, PEM_CONTENT_TYPE)], pem).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode public key");
            e.into_response()
        }
    }
}

/// `GET /.well-known/jwks.json`
pub async fn jwks(State(state): State<AppState>) -> Response {
    Json(state.service.keys().jwks()).into_response()
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics() -> Response {
    ([(CONTENT_TYPE, METRICS_CONTENT_TYPE)], service_metrics::render()).into_response()
}
