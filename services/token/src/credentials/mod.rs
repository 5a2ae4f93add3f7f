//! Client credential lookup and verification.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod verifier;

pub use memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
pub use store::{ClientRecord, CredentialStore, StoreError};
pub use verifier::{CredentialVerifier, FailedAttemptAudit};
