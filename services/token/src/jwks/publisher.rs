//! JWK and JWK Set representations of the signing key's public half.
//!
//! The key id is the RFC 7638 thumbprint of the JWK, so it is stable for a
//! given key and needs no separate bookkeeping.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::Algorithm;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// RSA public key as a JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub n: String,
    pub e: String,
}

impl Jwk {
    /// Builds the JWK for an RSA public key, deriving `kid` from its thumbprint.
    #[must_use]
    pub fn from_rsa(public_key: &RsaPublicKey, algorithm: Algorithm) -> Self {
        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
        let kid = JwkThumbprint::compute_rsa(&n, &e);

        Jwk {
            kty: "RSA".to_string(),
            kid,
            key_use: "sig".to_string(),
            alg: format!("{algorithm:?}"),
            n,
            e,
        }
    }
}

/// JWK Set document served at `/.well-known/jwks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// A set holding exactly one key.
    #[must_use]
    pub fn single(key: Jwk) -> Self {
        Jwks { keys: vec![key] }
    }

    /// Looks a key up by id.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// JWK thumbprint per RFC 7638.
pub struct JwkThumbprint;

impl JwkThumbprint {
    /// SHA-256 thumbprint over the required RSA members in lexicographic order.
    #[must_use]
    pub fn compute_rsa(n: &str, e: &str) -> String {
        let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }
}
