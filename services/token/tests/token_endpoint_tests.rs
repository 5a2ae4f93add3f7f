//! End-to-end tests of the HTTP surface, driven through the router with
//! `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use oauth_token_service::config::DatabaseConfig;
use oauth_token_service::credentials::{
    CredentialStore, CredentialVerifier, FailedAttemptAudit, InMemoryCredentialStore,
    PostgresCredentialStore,
};
use oauth_token_service::jwks::Jwks;
use oauth_token_service::jwt::{TokenClaims, TokenIssuer};
use oauth_token_service::{router, AppState, KeyManager, TokenService};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgSslMode;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const PKCS8_PEM: &str = include_str!("fixtures/rsa_private_pkcs8.pem");
const ISSUER: &str = "antonio-oauth-server";

fn app_with_store(store: Arc<dyn CredentialStore>) -> Router {
    let keys = Arc::new(KeyManager::from_pem(PKCS8_PEM.as_bytes()).unwrap());
    let service = TokenService::new(
        CredentialVerifier::new(store, FailedAttemptAudit::ClientId),
        TokenIssuer::new(ISSUER),
        keys,
    );
    router(AppState::new(service), Duration::from_secs(30))
}

fn app(store: Arc<InMemoryCredentialStore>) -> Router {
    app_with_store(store)
}

fn default_store() -> Arc<InMemoryCredentialStore> {
    Arc::new(InMemoryCredentialStore::new().with_client("app1", "s3cr3t"))
}

fn token_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn grant_body(client_id: &str, secret: &str, grant_type: &str) -> String {
    serde_json::json!({
        "client_id": client_id,
        "client_secret": secret,
        "grant_type": grant_type,
    })
    .to_string()
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_valid_grant_returns_bearer_token() {
    let response = app(default_store())
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let token = body["access_token"].as_str().unwrap();
    let header = decode_header(token).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
}

#[tokio::test]
async fn test_token_verifies_with_published_public_key() {
    let store = default_store();

    let response = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();
    let token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get(app(store), "/public-key").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-pem-file"
    );
    let pem = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_aud = false;
    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims.sub, "app1");
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_public_key_matches_fixture() {
    let response = get(app(default_store()), "/public-key").await;
    let pem = String::from_utf8(body_bytes(response).await).unwrap();

    assert_eq!(pem, include_str!("fixtures/rsa_public.pem"));
}

#[tokio::test]
async fn test_token_kid_is_published_in_jwks() {
    let store = default_store();

    let response = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();
    let token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let kid = decode_header(&token).unwrap().kid.unwrap();

    let response = get(app(store), "/.well-known/jwks.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let jwks: Jwks = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let jwk = jwks.find(&kid).unwrap();
    assert_eq!(jwk.kty, "RSA");
    assert_eq!(jwk.alg, "RS256");
}

#[tokio::test]
async fn test_unsupported_grant_type_is_rejected_before_lookup() {
    let store = default_store();

    let response = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "password")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_grant_type");
    assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let store = default_store();

    for body in ["", "{", "[1,2]", r#"{"client_id":"app1"}"#] {
        let response = app(Arc::clone(&store))
            .oneshot(token_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await["error"], "invalid_request");
    }
    assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn test_unknown_client_and_wrong_secret_are_indistinguishable() {
    let store = default_store();

    let wrong_secret = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "nope", "client_credentials")))
        .await
        .unwrap();
    let unknown_client = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("ghost", "s3cr3t", "client_credentials")))
        .await
        .unwrap();

    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_client.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(wrong_secret).await, body_bytes(unknown_client).await);
}

#[tokio::test]
async fn test_store_outage_looks_like_invalid_client() {
    let store = default_store();
    let wrong_secret = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "nope", "client_credentials")))
        .await
        .unwrap();

    store.set_unavailable(true);
    let outage = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();

    assert_eq!(outage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(outage).await, body_bytes(wrong_secret).await);
}

#[tokio::test]
async fn test_unreachable_database_looks_like_invalid_client() {
    let config = DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        user: "postgres".to_string(),
        password: SecretString::from(String::new()),
        name: "postgres".to_string(),
        ssl_mode: PgSslMode::Disable,
        max_connections: 1,
        acquire_timeout: Duration::from_secs(1),
    };
    let store = Arc::new(PostgresCredentialStore::connect_lazy(&config));

    let response = app_with_store(store)
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_client");
    assert_eq!(body["error_description"], "Invalid client credentials");
}

#[tokio::test]
async fn test_get_on_token_endpoint_is_method_not_allowed() {
    let response = get(app(default_store()), "/token").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health() {
    let response = get(app(default_store()), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn test_cors_preflight() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/token")
        .header(header::ORIGIN, "https://client.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(default_store()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_metrics_exposes_issued_tokens() {
    let store = default_store();
    let response = app(Arc::clone(&store))
        .oneshot(token_request(&grant_body("app1", "s3cr3t", "client_credentials")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app(store), "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("oauth_token_service_tokens_issued_total"));
}
