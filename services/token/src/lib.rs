//! OAuth2 token service library.
//!
//! Issues RS256-signed access tokens for the `client_credentials` grant,
//! verifying clients against a credential store, and publishes the public
//! half of the signing key as PEM and JWKS.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod grant;
pub mod http;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod observability;
pub mod shutdown;

// Re-exports for convenience
pub use config::Config;
pub use error::{KeyLoadError, TokenError};
pub use grant::TokenService;
pub use http::{router, AppState};
pub use keys::KeyManager;
