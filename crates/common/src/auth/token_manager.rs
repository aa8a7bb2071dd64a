//! Token manager with single-flight refresh
//!
//! Manages the bearer token lifecycle:
//! - Token reuse from memory, then from the credential store
//! - Refresh through the client-credentials grant when missing or expiring
//! - Persistence of every fresh token and its expiry
//! - At most one refresh in flight; concurrent callers share its result

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use patcher_domain::{CredentialKey, PatcherError};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::traits::TokenClient;
use super::types::{AccessToken, ClientCredentials};
use crate::security::CredentialStore;

/// Token manager
///
/// The cached token lives behind an async mutex that is held across the
/// network call, so callers arriving during a refresh wait for it and then
/// observe the fresh token instead of starting their own.
pub struct TokenManager<C: TokenClient, S: CredentialStore> {
    client: Arc<C>,
    store: Arc<S>,
    current: Mutex<Option<AccessToken>>,
    refresh_leeway: Duration,
}

impl<C: TokenClient, S: CredentialStore> TokenManager<C, S> {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `client` - Client-credentials grant implementation
    /// * `store` - Credential store holding the server URL, client id/secret
    ///   and the persisted token
    /// * `refresh_leeway_secs` - Treat a token as expired this many seconds
    ///   before its actual expiry
    pub fn new(client: Arc<C>, store: Arc<S>, refresh_leeway_secs: i64) -> Self {
        Self {
            client,
            store,
            current: Mutex::new(None),
            refresh_leeway: Duration::seconds(refresh_leeway_secs.max(0)),
        }
    }

    /// Return a token that is valid for at least the refresh leeway.
    ///
    /// Looks in memory first, then in the credential store, and only then
    /// runs the client-credentials grant.
    ///
    /// # Errors
    /// - [`PatcherError::TokenFetch`] if credentials are missing or the grant
    ///   fails
    /// - [`PatcherError::TokenLifetime`] if the fresh token would expire within
    ///   the refresh leeway
    /// - [`PatcherError::Keychain`] if the credential store cannot be accessed
    pub async fn ensure_valid_token(&self) -> Result<AccessToken, PatcherError> {
        let mut current = self.current.lock().await;
        let now = Utc::now();

        if let Some(token) =
            current.as_ref().filter(|token| token.is_valid_at(now, self.refresh_leeway))
        {
            return Ok(token.clone());
        }

        if let Some(stored) = self.load_persisted()? {
            if stored.is_valid_at(now, self.refresh_leeway) {
                debug!("Reusing token from credential store");
                *current = Some(stored.clone());
                return Ok(stored);
            }
        }

        *current = None;
        let fresh = self.refresh().await?;
        *current = Some(fresh.clone());
        Ok(fresh)
    }

    /// Replace a token the server rejected.
    ///
    /// If another caller already replaced `stale`, its replacement is
    /// returned without a second refresh.
    ///
    /// # Errors
    /// Same as [`Self::ensure_valid_token`].
    pub async fn force_refresh(&self, stale: &AccessToken) -> Result<AccessToken, PatcherError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current
            .as_ref()
            .filter(|token| token.value != stale.value)
            .filter(|token| token.is_valid_at(Utc::now(), self.refresh_leeway))
        {
            debug!("Token already replaced by a concurrent refresh");
            return Ok(token.clone());
        }

        *current = None;
        let fresh = self.refresh().await?;
        *current = Some(fresh.clone());
        Ok(fresh)
    }

    /// Token currently cached in memory, if any.
    pub async fn current_token(&self) -> Option<AccessToken> {
        self.current.lock().await.clone()
    }

    async fn refresh(&self) -> Result<AccessToken, PatcherError> {
        let credentials = self.load_credentials()?;

        info!("Requesting new bearer token");
        let token = self.client.client_credentials(&credentials).await.map_err(|e| {
            error!(error = %e, "Token request failed");
            e
        })?;

        if !token.is_valid_at(Utc::now(), self.refresh_leeway) {
            let lifetime = token.seconds_until_expiry();
            warn!(lifetime, "Issued token expires within the refresh leeway");
            return Err(PatcherError::token_lifetime(lifetime));
        }

        self.persist(&token)?;
        info!(expires_at = %token.expires_at, "Successfully refreshed bearer token");
        Ok(token)
    }

    fn load_credentials(&self) -> Result<ClientCredentials, PatcherError> {
        let require = |key: CredentialKey| -> Result<String, PatcherError> {
            self.store
                .get(key)?
                .filter(|value| !value.is_empty())
                .ok_or_else(|| PatcherError::token_fetch(format!("missing {key} credential")))
        };

        Ok(ClientCredentials::new(
            require(CredentialKey::Url)?,
            require(CredentialKey::ClientId)?,
            require(CredentialKey::ClientSecret)?,
        ))
    }

    fn load_persisted(&self) -> Result<Option<AccessToken>, PatcherError> {
        let Some(value) = self.store.get(CredentialKey::Token)? else {
            return Ok(None);
        };
        let Some(raw_expiry) = self.store.get(CredentialKey::TokenExpiration)? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw_expiry) {
            Ok(expires_at) => Ok(Some(AccessToken::new(value, expires_at.with_timezone(&Utc)))),
            Err(e) => {
                warn!(error = %e, "Ignoring stored token with unreadable expiry");
                Ok(None)
            }
        }
    }

    fn persist(&self, token: &AccessToken) -> Result<(), PatcherError> {
        self.store.set(CredentialKey::Token, &token.value)?;
        self.store.set(CredentialKey::TokenExpiration, &token.expires_at.to_rfc3339())?;
        Ok(())
    }
}
