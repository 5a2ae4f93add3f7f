use crate::error::TokenError;
use crate::jwt::claims::TokenClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Encodes and verifies compact JWS tokens for one algorithm.
pub struct JwtSerializer {
    algorithm: Algorithm,
}

impl JwtSerializer {
    #[must_use]
    pub const fn new(algorithm: Algorithm) -> Self {
        JwtSerializer { algorithm }
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::IssuanceFailure`] if the key does not match the
    /// algorithm or signing fails.
    pub fn serialize(
        &self,
        claims: &TokenClaims,
        key: &EncodingKey,
        key_id: Option<&str>,
    ) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm);
        header.kid = key_id.map(str::to_string);

        encode(&header, claims, key).map_err(TokenError::from)
    }

    /// Verify signature, expiry and issuer, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns the `jsonwebtoken` error for any signature or claim failure.
    pub fn deserialize(
        &self,
        token: &str,
        key: &DecodingKey,
        issuer: &str,
    ) -> jsonwebtoken::errors::Result<TokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.validate_aud = false;

        decode::<TokenClaims>(token, key, &validation).map(|data| data.claims)
    }
}
