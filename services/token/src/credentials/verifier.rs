//! Client credential verification.
//!
//! Unknown client and wrong secret fail the same way and do the same work:
//! both secrets are digested with SHA-256 and the digests compared with
//! `subtle`, and an unknown client is compared against a sentinel.

use super::store::{ClientRecord, CredentialStore};
use crate::error::TokenError;
use crate::metrics;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::{Choice, ConstantTimeEq};
use tracing::{error, warn};

const UNKNOWN_CLIENT_SENTINEL: &[u8] = b"\0unknown-client\0";

/// Fields recorded when a client fails to authenticate.
///
/// The secret is never part of any variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAttemptAudit {
    /// Record the presented client id
    ClientId,
    /// Record only that a failure happened
    Anonymous,
}

impl FailedAttemptAudit {
    /// Names of the fields this policy writes to the log.
    #[must_use]
    pub const fn logged_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ClientId => &["client_id"],
            Self::Anonymous => &[],
        }
    }

    fn record(self, client_id: &str) {
        match self {
            Self::ClientId => warn!(client_id = %client_id, "Client authentication failed"),
            Self::Anonymous => warn!("Client authentication failed"),
        }
    }
}

/// Checks presented client credentials against the store.
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    audit: FailedAttemptAudit,
}

impl CredentialVerifier {
    /// Create a verifier over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, audit: FailedAttemptAudit) -> Self {
        Self { store, audit }
    }

    /// Verify `client_id` / `presented_secret` against the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidCredentials`] for an unknown client or a
    /// wrong secret, and [`TokenError::StoreUnavailable`] when the store
    /// cannot answer. Both render identically to callers.
    pub async fn verify(
        &self,
        client_id: &str,
        presented_secret: &SecretString,
    ) -> Result<ClientRecord, TokenError> {
        let record = match self.store.find_client(client_id).await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    error = %e,
                    retryable = e.is_retryable(),
                    "Credential store lookup failed"
                );
                metrics::record_client_authentication("store_error");
                return Err(TokenError::StoreUnavailable(e));
            }
        };

        let stored = record
            .as_ref()
            .map_or(UNKNOWN_CLIENT_SENTINEL, |r| r.secret.expose_secret().as_bytes());
        let known = Choice::from(u8::from(record.is_some()));
        let matched = known & secrets_match(stored, presented_secret.expose_secret().as_bytes());

        match record {
            Some(record) if bool::from(matched) => {
                metrics::record_client_authentication("success");
                Ok(record)
            }
            _ => {
                self.audit.record(client_id);
                metrics::record_client_authentication("failure");
                Err(TokenError::InvalidCredentials)
            }
        }
    }
}

/// Constant-time equality over SHA-256 digests, so length does not leak either.
fn secrets_match(stored: &[u8], presented: &[u8]) -> Choice {
    let stored = Sha256::digest(stored);
    let presented = Sha256::digest(presented);
    stored.as_slice().ct_eq(presented.as_slice())
}
