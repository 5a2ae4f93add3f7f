//! Access token issuance.

use crate::error::TokenError;
use crate::jwt::claims::{TokenClaims, ACCESS_TOKEN_TTL};
use crate::jwt::serializer::JwtSerializer;
use crate::keys::KeyManager;
use crate::metrics;
use chrono::Utc;
use std::time::Duration;
use tracing::error;

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub claims: TokenClaims,
}

/// Builds and signs claim sets for verified clients.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    issuer: String,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer stamping `iss` with `issuer`.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        TokenIssuer {
            issuer: issuer.into(),
            ttl: ACCESS_TOKEN_TTL,
        }
    }

    /// Value of the `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `subject`, signed with the manager's key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::IssuanceFailure`] if signing fails. No unsigned
    /// token is ever produced.
    pub fn issue(&self, subject: &str, keys: &KeyManager) -> Result<IssuedToken, TokenError> {
        let claims = TokenClaims::new(self.issuer.clone(), subject.to_string(), Utc::now(), self.ttl);

        let access_token = JwtSerializer::new(keys.algorithm())
            .serialize(&claims, keys.encoding_key(), Some(keys.key_id()))
            .inspect_err(|e| error!(error = %e, kid = %keys.key_id(), "Token signing failed"))?;

        metrics::record_token_issued(&format!("{:?}", keys.algorithm()));

        Ok(IssuedToken {
            access_token,
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    const PKCS8_PEM: &str = include_str!("../../tests/fixtures/rsa_private_pkcs8.pem");

    #[test]
    fn test_issue_signs_verifiable_token() {
        let keys = KeyManager::from_pem(PKCS8_PEM.as_bytes()).unwrap();
        let issuer = TokenIssuer::new("antonio-oauth-server");

        let issued = issuer.issue("app1", &keys).unwrap();
        let decoded = JwtSerializer::new(Algorithm::RS256)
            .deserialize(&issued.access_token, &keys.decoding_key().unwrap(), issuer.issuer())
            .unwrap();

        assert_eq!(decoded, issued.claims);
        assert_eq!(decoded.sub, "app1");
        assert_eq!(decoded.iss, "antonio-oauth-server");
        assert_eq!(decoded.expires_in(), 3600);
    }

    #[test]
    fn test_back_to_back_tokens_differ() {
        let keys = KeyManager::from_pem(PKCS8_PEM.as_bytes()).unwrap();
        let issuer = TokenIssuer::new("iss");

        let first = issuer.issue("app1", &keys).unwrap();
        let second = issuer.issue("app1", &keys).unwrap();

        assert_ne!(first.access_token, second.access_token);
    }
}
