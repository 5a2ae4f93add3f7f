//! In-memory credential store for tests and local development.

use super::store::{ClientRecord, CredentialStore, StoreError};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Fixed set of clients held in memory.
///
/// Counts lookups so callers can assert whether the store was consulted, and
/// can be switched into an outage mode where every lookup fails.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    clients: HashMap<String, SecretString>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client.
    #[must_use]
    pub fn with_client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.clients.insert(id.into(), SecretString::from(secret.into()));
        self
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every subsequent lookup fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl FromIterator<ClientRecord> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = ClientRecord>>(iter: I) -> Self {
        let clients = iter.into_iter().map(|r| (r.id, r.secret)).collect();

        Self {
            clients,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store switched off"));
        }

        Ok(self
            .clients
            .get(client_id)
            .map(|secret| ClientRecord::new(client_id, secret.expose_secret())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_known_and_unknown() {
        let store = InMemoryCredentialStore::new().with_client("app1", "s3cr3t");

        let found = store.find_client("app1").await.unwrap().unwrap();
        assert_eq!(found.id, "app1");
        assert_eq!(found.secret.expose_secret(), "s3cr3t");

        assert!(store.find_client("app2").await.unwrap().is_none());
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn test_outage_mode() {
        let store = InMemoryCredentialStore::new().with_client("app1", "s3cr3t");
        store.set_unavailable(true);

        let err = store.find_client("app1").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_collect_from_records() {
        let store: InMemoryCredentialStore = vec![
            ClientRecord::new("a", "1"),
            ClientRecord::new("b", "2"),
        ]
        .into_iter()
        .collect();

        assert!(store.find_client("b").await.unwrap().is_some());
        assert_eq!(store.lookups(), 1);
    }
}
