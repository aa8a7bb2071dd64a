//! Token and credential types for the client-credentials grant

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use patcher_domain::PatcherError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A bearer token together with its absolute expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self { value: value.into(), expires_at }
    }

    /// Token that expires `lifetime_secs` after `issued_at`.
    ///
    /// # Errors
    /// [`PatcherError::TokenLifetime`] when the expiry is not representable.
    pub fn with_lifetime(
        value: impl Into<String>,
        lifetime_secs: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, PatcherError> {
        let expires_at = Duration::try_seconds(lifetime_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| PatcherError::token_lifetime(lifetime_secs))?;
        Ok(Self::new(value, expires_at))
    }

    /// A token is usable when it is non-empty and outlives `now + leeway`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        !self.value.is_empty()
            && now.checked_add_signed(leeway).is_some_and(|limit| self.expires_at > limit)
    }

    /// Seconds remaining until expiry (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

// Never print the bearer value.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Everything needed to run the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub server_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        server_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("server_url", &self.server_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Interpret an OAuth token response body.
///
/// # Errors
/// - [`PatcherError::TokenFetch`] when `access_token` is missing, empty or
///   not a string
/// - [`PatcherError::TokenLifetime`] when `expires_in` is absent, not
///   positive or too large to yield an expiry
pub fn parse_token_response(
    body: &Value,
    issued_at: DateTime<Utc>,
) -> Result<AccessToken, PatcherError> {
    let value = body
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| PatcherError::token_fetch("response did not contain an access_token"))?;

    let expires_in = body
        .get("expires_in")
        .and_then(|raw| raw.as_i64().or_else(|| raw.as_f64().map(|secs| secs as i64)))
        .unwrap_or(0);

    if expires_in <= 0 {
        return Err(PatcherError::token_lifetime(expires_in));
    }

    AccessToken::with_lifetime(value, expires_in, issued_at)
}
