//! Credential store contract.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Stored client identity and secret.
///
/// Owned by the store and re-fetched on every request.
#[derive(Debug)]
pub struct ClientRecord {
    /// Client identifier
    pub id: String,
    /// Client secret as stored
    pub secret: SecretString,
}

impl ClientRecord {
    /// Create a record from an id and a plain secret.
    #[must_use]
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: SecretString::from(secret.into()),
        }
    }
}

/// Errors reaching or querying the credential store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached (pool exhausted, connection refused, I/O)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Query failed or returned an unexpected shape
    #[error("store query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Check if this error is transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a query error with the given message.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

/// Single-lookup view of the client credential store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the record for `client_id`, or `None` when no such client exists.
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_record_debug_redacts_secret() {
        let record = ClientRecord::new("app1", "s3cr3t");
        let debug = format!("{record:?}");

        assert!(debug.contains("app1"));
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(record.secret.expose_secret(), "s3cr3t");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::unavailable("pool timed out").is_retryable());
        assert!(!StoreError::query("column missing").is_retryable());
    }
}
