//! Traits for token and credential operations
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the OAuth token endpoint, the system keychain).

use async_trait::async_trait;
use patcher_domain::PatcherError;

use super::types::{AccessToken, ClientCredentials};

/// Trait for the OAuth client-credentials grant
///
/// Abstracts the token endpoint so the token manager can be exercised with
/// scripted responses.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Exchange client credentials for a bearer token
    ///
    /// # Arguments
    /// * `credentials` - Server URL, client id and client secret
    ///
    /// # Errors
    /// - [`PatcherError::TokenFetch`] on transport failure, non-2xx status or
    ///   a response without a usable `access_token`
    /// - [`PatcherError::TokenLifetime`] when the reported lifetime is not
    ///   positive
    async fn client_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<AccessToken, PatcherError>;
}
