//! Signing key lifecycle.
//!
//! The key is loaded once at startup and never changes afterwards. Nothing in
//! here takes a lock: every accessor is a pure function of the loaded key, so
//! the manager is shared across requests behind a plain `Arc`.

use crate::error::{KeyLoadError, TokenError};
use crate::jwks::{Jwk, Jwks};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

/// Algorithm used for every issued token.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Sole holder of the RSA signing key.
pub struct KeyManager {
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
    jwk: Jwk,
}

impl KeyManager {
    /// Load the signing key from a PEM file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLoadError::Unreadable`] if the file cannot be read and
    /// [`KeyLoadError::InvalidKey`] if it does not hold an RSA private key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyLoadError> {
        let path = path.as_ref();
        let pem = Zeroizing::new(std::fs::read(path).map_err(|source| {
            KeyLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        })?);

        let manager = Self::from_pem(&pem)?;

        info!(
            kid = %manager.key_id(),
            path = %path.display(),
            "Signing key loaded"
        );

        Ok(manager)
    }

    /// Parse a PEM-encoded RSA private key, PKCS#1 or PKCS#8.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLoadError::InvalidKey`] for anything that is not an RSA
    /// private key, including keys of another family.
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyLoadError> {
        let text = std::str::from_utf8(pem)
            .map_err(|_| KeyLoadError::InvalidKey("key file is not PEM text".to_string()))?;

        let private_key = RsaPrivateKey::from_pkcs1_pem(text)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(text))
            .map_err(|e| KeyLoadError::InvalidKey(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| KeyLoadError::InvalidKey(e.to_string()))?;

        let public_key = private_key.to_public_key();
        let jwk = Jwk::from_rsa(&public_key, SIGNING_ALGORITHM);

        Ok(Self {
            encoding_key,
            public_key,
            jwk,
        })
    }

    /// Key used by the issuer to sign tokens.
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Public half of the signing key.
    #[must_use]
    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Signing algorithm matching the key family.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        SIGNING_ALGORITHM
    }

    /// Key id placed in the `kid` header of issued tokens.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.jwk.kid
    }

    /// Public key as an SPKI (`PUBLIC KEY`) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyEncoding`] if DER/PEM encoding fails.
    pub fn public_key_pem(&self) -> Result<String, TokenError> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| TokenError::KeyEncoding(e.to_string()))
    }

    /// Public key as a JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// JWK Set holding the signing key.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks::single(self.jwk.clone())
    }

    /// Verification key for the public half.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyEncoding`] if the JWK components are rejected.
    pub fn decoding_key(&self) -> Result<DecodingKey, TokenError> {
        DecodingKey::from_rsa_components(&self.jwk.n, &self.jwk.e)
            .map_err(|e| TokenError::KeyEncoding(e.to_string()))
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("kid", &self.jwk.kid)
            .field("alg", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}
