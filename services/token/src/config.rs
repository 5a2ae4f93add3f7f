//! Centralized configuration for the token service.
//!
//! All configuration is loaded from environment variables and validated at
//! startup. [`Config::from_lookup`] takes any variable source so tests never
//! touch the process environment.

use crate::credentials::FailedAttemptAudit;
use crate::observability::{LogFormat, TracingConfig};
use secrecy::SecretString;
use sqlx::postgres::PgSslMode;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Credential database connection settings.
#[derive(Debug)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: SecretString,
    /// Database name
    pub name: String,
    /// TLS mode
    pub ssl_mode: PgSslMode,
    /// Pool size
    pub max_connections: u32,
    /// How long a lookup waits for a pooled connection
    pub acquire_timeout: Duration,
}

/// Token service configuration.
#[derive(Debug)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// PEM file holding the RSA signing key
    pub private_key_path: PathBuf,
    /// `iss` claim of issued tokens
    pub jwt_issuer: String,
    /// Credential store connection
    pub database: DatabaseConfig,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Log output settings
    pub tracing: TracingConfig,
    /// Fields logged on failed client authentication
    pub failed_attempt_audit: FailedAttemptAudit,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let ssl_mode = PgSslMode::from_str(&var("DB_SSLMODE", "disable")).map_err(|e| {
            ConfigError::ParseError {
                name: "DB_SSLMODE".to_string(),
                reason: e.to_string(),
            }
        })?;

        let log_format = match var("LOG_FORMAT", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::ParseError {
                    name: "LOG_FORMAT".to_string(),
                    reason: format!("expected json or pretty, got {other}"),
                })
            }
        };

        let failed_attempt_audit = if parse_var(&lookup, "AUDIT_LOG_CLIENT_ID", true)? {
            FailedAttemptAudit::ClientId
        } else {
            FailedAttemptAudit::Anonymous
        };

        let config = Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 8080)?,
            private_key_path: PathBuf::from(var("PRIVATE_KEY_PATH", "/etc/oauth/keys/private.pem")),
            jwt_issuer: var("JWT_ISSUER", "antonio-oauth-server"),
            database: DatabaseConfig {
                host: var("DB_HOST", "localhost"),
                port: parse_var(&lookup, "DB_PORT", 5432)?,
                user: var("DB_USER", "postgres"),
                password: SecretString::from(var("DB_PASSWORD", "")),
                name: var("DB_NAME", "postgres"),
                ssl_mode,
                max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_secs(parse_var(&lookup, "DB_ACQUIRE_TIMEOUT", 5)?),
            },
            request_timeout: Duration::from_secs(parse_var(&lookup, "REQUEST_TIMEOUT", 30)?),
            tracing: TracingConfig {
                log_level: var("LOG_LEVEL", "info"),
                format: log_format,
            },
            failed_attempt_audit,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.jwt_issuer.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_ISSUER".to_string()));
        }
        if self.private_key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("PRIVATE_KEY_PATH".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ParseError {
                name: "DB_MAX_CONNECTIONS".to_string(),
                reason: "pool size must be greater than 0".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("REQUEST_TIMEOUT".to_string()));
        }
        if self.database.acquire_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("DB_ACQUIRE_TIMEOUT".to_string()));
        }
        Ok(())
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
