//! Bearer token access for the management API
//!
//! The API client only needs "a valid token" and "replace this rejected
//! token"; the token manager from `patcher-common` provides both.

use async_trait::async_trait;
use patcher_common::auth::{AccessToken, TokenClient, TokenManager};
use patcher_common::security::CredentialStore;
use patcher_domain::PatcherError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token, refreshing it if needed.
    async fn access_token(&self) -> Result<AccessToken, PatcherError>;

    /// Replace a token the server answered with 401.
    async fn refresh_token(&self, rejected: &AccessToken) -> Result<AccessToken, PatcherError>;
}

#[async_trait]
impl<C, S> AccessTokenProvider for TokenManager<C, S>
where
    C: TokenClient + 'static,
    S: CredentialStore + 'static,
{
    async fn access_token(&self) -> Result<AccessToken, PatcherError> {
        self.ensure_valid_token().await
    }

    async fn refresh_token(&self, rejected: &AccessToken) -> Result<AccessToken, PatcherError> {
        self.force_refresh(rejected).await
    }
}
