//! Wire types for the token endpoint.

use crate::error::TokenError;
use crate::jwt::IssuedToken;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The only grant type this service accepts.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";

/// Token type reported in every successful response.
pub const BEARER: &str = "Bearer";

#[derive(Deserialize)]
struct GrantRequestBody {
    client_id: String,
    client_secret: String,
    grant_type: String,
}

/// A parsed grant request. The secret never appears in `Debug` output.
#[derive(Debug)]
pub struct GrantRequest {
    pub client_id: String,
    pub client_secret: SecretString,
    pub grant_type: String,
}

impl GrantRequest {
    /// Parse a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MalformedInput`] if the body is not a JSON
    /// object with string `client_id`, `client_secret` and `grant_type`.
    pub fn from_json(body: &[u8]) -> Result<Self, TokenError> {
        // every field is a string, so serde_json never quotes a string value back
        let body: GrantRequestBody =
            serde_json::from_slice(body).map_err(|e| TokenError::malformed(e.to_string()))?;

        Ok(Self {
            client_id: body.client_id,
            client_secret: SecretString::from(body.client_secret),
            grant_type: body.grant_type,
        })
    }

    #[must_use]
    pub fn is_client_credentials(&self) -> bool {
        self.grant_type == CLIENT_CREDENTIALS
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expires_in: u64::try_from(issued.claims.expires_in()).unwrap_or_default(),
            access_token: issued.access_token,
            token_type: BEARER.to_string(),
        }
    }
}
