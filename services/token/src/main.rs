use anyhow::Context;
use oauth_token_service::credentials::{CredentialVerifier, PostgresCredentialStore};
use oauth_token_service::jwt::TokenIssuer;
use oauth_token_service::observability::init_tracing;
use oauth_token_service::shutdown::wait_for_signal;
use oauth_token_service::{router, AppState, Config, KeyManager, TokenService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(&config.tracing).context("failed to initialize tracing")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        issuer = %config.jwt_issuer,
        "Starting OAuth token service"
    );

    let keys = match KeyManager::load(&config.private_key_path) {
        Ok(keys) => Arc::new(keys),
        Err(e) => {
            error!(error = %e, "Failed to load signing key");
            return Err(e.into());
        }
    };

    let store = Arc::new(PostgresCredentialStore::connect_lazy(&config.database));
    let service = TokenService::new(
        CredentialVerifier::new(store, config.failed_attempt_audit),
        TokenIssuer::new(config.jwt_issuer.clone()),
        keys,
    );
    let app = router(AppState::new(service), config.request_timeout);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "Token service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}
