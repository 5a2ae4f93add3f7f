//! The `client_credentials` grant pipeline.
//!
//! A request moves through [`GrantStage`]s in order and either reaches a
//! token response or is rejected at the stage it got to. Each request is
//! evaluated exactly once; there are no retries.

use super::request::{GrantRequest, TokenResponse};
use crate::credentials::CredentialVerifier;
use crate::error::TokenError;
use crate::jwt::TokenIssuer;
use crate::keys::KeyManager;
use crate::metrics;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Progress of a grant request through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStage {
    Received,
    Parsed,
    GrantValidated,
    CredentialsVerified,
    TokenIssued,
    Responded,
}

impl GrantStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Parsed => "parsed",
            Self::GrantValidated => "grant_validated",
            Self::CredentialsVerified => "credentials_verified",
            Self::TokenIssued => "token_issued",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for GrantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-level orchestrator: parse, validate grant, verify, issue.
pub struct TokenService {
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    keys: Arc<KeyManager>,
}

impl TokenService {
    #[must_use]
    pub fn new(verifier: CredentialVerifier, issuer: TokenIssuer, keys: Arc<KeyManager>) -> Self {
        Self {
            verifier,
            issuer,
            keys,
        }
    }

    /// Signing key manager shared with the public-key endpoints.
    #[must_use]
    pub fn keys(&self) -> &Arc<KeyManager> {
        &self.keys
    }

    /// Value stamped into the `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.issuer.issuer()
    }

    /// Run one grant request from raw body to token response.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] of the stage that rejected the request.
    pub async fn handle(&self, body: &[u8]) -> Result<TokenResponse, TokenError> {
        let started = Instant::now();
        let mut stage = GrantStage::Received;

        let result = self.run(body, &mut stage).await;

        metrics::record_grant_latency(started.elapsed().as_secs_f64());
        if let Err(ref e) = result {
            let code = e.code().as_str();
            metrics::record_grant_rejected(code);
            debug!(stage = %stage, code, error = %e, "Grant request rejected");
        }

        result
    }

    async fn run(&self, body: &[u8], stage: &mut GrantStage) -> Result<TokenResponse, TokenError> {
        let request = GrantRequest::from_json(body)?;
        *stage = GrantStage::Parsed;

        if !request.is_client_credentials() {
            return Err(TokenError::UnsupportedGrant(request.grant_type));
        }
        *stage = GrantStage::GrantValidated;

        let client = self
            .verifier
            .verify(&request.client_id, &request.client_secret)
            .await?;
        *stage = GrantStage::CredentialsVerified;

        let issued = self.issuer.issue(&client.id, &self.keys)?;
        *stage = GrantStage::TokenIssued;

        info!(
            client_id = %client.id,
            jti = %issued.claims.jti,
            exp = issued.claims.exp,
            "Issued access token"
        );

        let response = TokenResponse::from(issued);
        *stage = GrantStage::Responded;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{FailedAttemptAudit, InMemoryCredentialStore};

    const PKCS8_PEM: &str = include_str!("../../tests/fixtures/rsa_private_pkcs8.pem");

    fn service(store: Arc<InMemoryCredentialStore>) -> TokenService {
        let keys = Arc::new(KeyManager::from_pem(PKCS8_PEM.as_bytes()).unwrap());
        TokenService::new(
            CredentialVerifier::new(store, FailedAttemptAudit::ClientId),
            TokenIssuer::new("antonio-oauth-server"),
            keys,
        )
    }

    #[tokio::test]
    async fn test_happy_path() {
        let store = Arc::new(InMemoryCredentialStore::new().with_client("app1", "s3cr3t"));
        let service = service(store);

        let body = br#"{"client_id":"app1","client_secret":"s3cr3t","grant_type":"client_credentials"}"#;
        let response = service.handle(body).await.unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.access_token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_grant_skips_store() {
        let store = Arc::new(InMemoryCredentialStore::new().with_client("app1", "s3cr3t"));
        let service = service(Arc::clone(&store));

        let body = br#"{"client_id":"app1","client_secret":"s3cr3t","grant_type":"password"}"#;
        let err = service.handle(body).await.unwrap_err();

        assert!(matches!(err, TokenError::UnsupportedGrant(_)));
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_skips_store() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = service(Arc::clone(&store));

        let err = service.handle(b"{").await.unwrap_err();

        assert!(matches!(err, TokenError::MalformedInput(_)));
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let store = Arc::new(InMemoryCredentialStore::new().with_client("app1", "s3cr3t"));
        let service = service(Arc::clone(&store));

        let body = br#"{"client_id":"app1","client_secret":"wrong","grant_type":"client_credentials"}"#;
        let err = service.handle(body).await.unwrap_err();

        assert!(matches!(err, TokenError::InvalidCredentials));
        assert_eq!(store.lookups(), 1);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(GrantStage::GrantValidated.to_string(), "grant_validated");
        assert_eq!(GrantStage::TokenIssued.as_str(), "token_issued");
    }
}
