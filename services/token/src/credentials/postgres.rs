//! PostgreSQL-backed credential store.

use super::store::{ClientRecord, CredentialStore, StoreError};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::debug;

const FIND_CLIENT_QUERY: &str = "SELECT id, client_secret FROM oauth_clients WHERE id = $1";

/// Credential store reading the `oauth_clients` table.
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Create a store with a lazily connecting pool.
    ///
    /// No connection is attempted here; an unreachable database surfaces on
    /// the first lookup as [`StoreError::Unavailable`].
    #[must_use]
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.expose_secret())
            .database(&config.name)
            .ssl_mode(config.ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        debug!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "Credential store pool created"
        );

        Self { pool }
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>, StoreError> {
        let row = sqlx::query(FIND_CLIENT_QUERY)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<ClientRecord, StoreError> {
            let id: String = r.try_get("id")?;
            let secret: String = r.try_get("client_secret")?;
            Ok(ClientRecord::new(id, secret))
        })
        .transpose()
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}
