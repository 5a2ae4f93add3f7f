//! HTTP surface: routes, CORS and request middleware.

pub mod handlers;

use crate::grant::TokenService;
use axum::http::header::{
    HeaderName, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE,
};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Grant pipeline and signing key
    pub service: Arc<TokenService>,
}

impl AppState {
    /// Wrap a token service for sharing across handlers.
    #[must_use]
    pub fn new(service: TokenService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/token", post(handlers::token))
        .route("/public-key", get(handlers::public_key))
        .route("/.well-known/jwks.json", get(handlers::jwks))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Any origin may call the endpoints; browsers get the methods and headers
/// existing clients already send.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            CONTENT_LENGTH,
            ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            AUTHORIZATION,
        ])
}
