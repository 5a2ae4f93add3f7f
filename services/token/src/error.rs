//! Error taxonomy for the token service.
//!
//! Startup failures (`KeyLoadError`, `ConfigError`) are fatal. Everything in
//! `TokenError` is request-scoped and is rendered to callers through
//! [`ErrorCode`], which only ever carries a generic message. The `Display`
//! form of each error holds the operator-facing detail and goes to logs only.

use crate::credentials::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the signing key at startup.
#[derive(Error, Debug)]
pub enum KeyLoadError {
    /// The key file could not be read.
    #[error("failed to read signing key at {}: {source}", path.display())]
    Unreadable {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a PEM-encoded RSA private key.
    #[error("signing key is not a valid RSA private key: {0}")]
    InvalidKey(String),
}

/// Request-scoped failures of the grant pipeline.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TokenError {
    /// Request body could not be parsed into a grant request
    #[error("malformed grant request: {0}")]
    MalformedInput(String),

    /// Grant type other than `client_credentials`
    #[error("unsupported grant type: {0:?}")]
    UnsupportedGrant(String),

    /// Unknown client or wrong secret
    #[error("invalid client credentials")]
    InvalidCredentials,

    /// Credential store could not answer the lookup
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Claims could not be signed
    #[error("token issuance failed: {0}")]
    IssuanceFailure(String),

    /// Public key could not be serialized for distribution
    #[error("public key encoding failed: {0}")]
    KeyEncoding(String),
}

impl TokenError {
    /// Get the response classification for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedInput(_) => ErrorCode::InvalidRequest,
            Self::UnsupportedGrant(_) => ErrorCode::UnsupportedGrantType,
            Self::InvalidCredentials | Self::StoreUnavailable(_) => ErrorCode::InvalidClient,
            Self::IssuanceFailure(_) | Self::KeyEncoding(_) => ErrorCode::ServerError,
        }
    }

    /// Create an issuance failure with the given message.
    #[must_use]
    pub fn issuance(msg: impl Into<String>) -> Self {
        Self::IssuanceFailure(msg.into())
    }

    /// Create a malformed input error with the given message.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::IssuanceFailure(err.to_string())
    }
}

/// Caller-visible error classes, following RFC 6749 section 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed request body
    InvalidRequest,
    /// Grant type not supported
    UnsupportedGrantType,
    /// Client authentication failed
    InvalidClient,
    /// Key or signing failure
    ServerError,
}

impl ErrorCode {
    /// OAuth2 `error` string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidClient => "invalid_client",
            Self::ServerError => "server_error",
        }
    }

    /// HTTP status for this error class.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::UnsupportedGrantType => StatusCode::BAD_REQUEST,
            Self::InvalidClient => StatusCode::UNAUTHORIZED,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic, non-enumerable message shown to callers.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid request body",
            Self::UnsupportedGrantType => "Unsupported grant_type",
            Self::InvalidClient => "Invalid client credentials",
            Self::ServerError => "Internal error",
        }
    }
}

/// JSON error body returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// OAuth2 error code
    pub error: &'static str,
    /// Generic description
    pub error_description: &'static str,
}

impl From<ErrorCode> for ErrorResponse {
    fn from(code: ErrorCode) -> Self {
        Self {
            error: code.as_str(),
            error_description: code.message(),
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let code = self.code();
        (code.status(), Json(ErrorResponse::from(code))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            TokenError::malformed("eof").code().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TokenError::UnsupportedGrant("password".to_string()).code().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TokenError::InvalidCredentials.code().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TokenError::issuance("bad key").code().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_failure_renders_as_invalid_client() {
        let outage = TokenError::from(StoreError::unavailable("connection refused"));
        assert_eq!(outage.code(), TokenError::InvalidCredentials.code());
        assert_eq!(
            ErrorResponse::from(outage.code()),
            ErrorResponse::from(TokenError::InvalidCredentials.code())
        );
    }

    #[test]
    fn test_response_hides_detail() {
        let err = TokenError::issuance("RSA key rejected: modulus too small");
        let body = ErrorResponse::from(err.code());
        assert_eq!(body.error, "server_error");
        assert!(!body.error_description.contains("RSA"));
    }
}
