use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifetime of every access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    /// Client id of the authenticated caller
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl TokenClaims {
    /// Claims for `subject` issued at `issued_at`, expiring `ttl` later.
    ///
    /// A zero TTL is raised to one second so that `exp > iat` always holds.
    #[must_use]
    pub fn new(issuer: String, subject: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        TokenClaims {
            iss: issuer,
            sub: subject,
            iat,
            exp: iat.saturating_add(ttl_secs),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Seconds between issue and expiry.
    #[must_use]
    pub const fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }

    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        timestamp >= self.exp
    }
}
