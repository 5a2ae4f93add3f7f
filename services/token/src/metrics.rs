//! Prometheus metrics for the token service.
//!
//! Counters and histograms are registered lazily in the default registry and
//! exposed at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "oauth_token_service_tokens_issued_total",
        "Total number of access tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Rejected grant requests counter.
pub static GRANT_REJECTIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "oauth_token_service_grant_rejections_total",
        "Total number of rejected grant requests",
        &["reason"]
    )
    .expect("Failed to register grant_rejections metric")
});

/// Client authentication outcomes counter.
pub static CLIENT_AUTHENTICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "oauth_token_service_client_authentications_total",
        "Total number of client authentication attempts",
        &["outcome"]
    )
    .expect("Failed to register client_authentications metric")
});

/// Grant request latency histogram.
pub static GRANT_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "oauth_token_service_grant_latency_seconds",
        "Grant request processing latency in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register grant_latency metric")
});

/// Record a token issuance.
pub fn record_token_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a rejected grant request.
pub fn record_grant_rejected(reason: &str) {
    GRANT_REJECTIONS.with_label_values(&[reason]).inc();
}

/// Record a client authentication outcome.
pub fn record_client_authentication(outcome: &str) {
    CLIENT_AUTHENTICATIONS.with_label_values(&[outcome]).inc();
}

/// Record grant processing latency.
pub fn record_grant_latency(duration_secs: f64) {
    GRANT_LATENCY.observe(duration_secs);
}

/// Render every registered metric in the Prometheus text format.
#[must_use]
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
