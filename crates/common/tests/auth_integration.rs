//! Integration tests for auth module
//!
//! Tests token reuse, single-flight refresh, persistence and failure
//! handling of the token manager against in-memory collaborators.

#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use patcher_common::auth::{AccessToken, TokenManager};
use patcher_common::security::CredentialStore;
use patcher_common::testing::{MockKeychainProvider, MockTokenClient};
use patcher_domain::{CredentialKey, PatcherError};

type Manager = TokenManager<MockTokenClient, MockKeychainProvider>;

fn configured_keychain() -> MockKeychainProvider {
    MockKeychainProvider::with_entries([
        (CredentialKey::Url, "https://jamf.example.com"),
        (CredentialKey::ClientId, "client-123"),
        (CredentialKey::ClientSecret, "secret-456"),
    ])
}

fn manager(client: &MockTokenClient, keychain: &MockKeychainProvider) -> Arc<Manager> {
    Arc::new(TokenManager::new(Arc::new(client.clone()), Arc::new(keychain.clone()), 30))
}

/// Validates that a cached valid token is reused without a second grant.
///
/// # Test Steps
/// 1. Request a token twice from the same manager
/// 2. Verify both calls return the same token
/// 3. Verify the client was called exactly once
#[tokio::test(flavor = "multi_thread")]
async fn test_valid_token_is_reused() {
    let client = MockTokenClient::new();
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let first = manager.ensure_valid_token().await.unwrap();
    let second = manager.ensure_valid_token().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.call_count(), 1);
}

/// Validates that concurrent callers share one refresh.
///
/// The mock client sleeps before answering so every caller arrives while
/// the first refresh is still in flight.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_single_refresh() {
    let client = MockTokenClient::new();
    client.set_delay(Duration::from_millis(100));
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let handles = (0..8).map(|_| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.ensure_valid_token().await })
    });
    let tokens: Vec<AccessToken> =
        join_all(handles).await.into_iter().map(|joined| joined.unwrap().unwrap()).collect();

    assert_eq!(client.call_count(), 1);
    assert!(tokens.iter().all(|token| token == &tokens[0]));
}

/// Validates that a fresh token and its expiry are written to the store.
#[tokio::test(flavor = "multi_thread")]
async fn test_fresh_token_is_persisted() {
    let client = MockTokenClient::new();
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let token = manager.ensure_valid_token().await.unwrap();

    assert_eq!(keychain.value(CredentialKey::Token).as_deref(), Some(token.value.as_str()));
    assert_eq!(
        keychain.value(CredentialKey::TokenExpiration),
        Some(token.expires_at.to_rfc3339())
    );
}

/// Validates that a persisted, unexpired token is used without network.
#[tokio::test(flavor = "multi_thread")]
async fn test_persisted_token_is_loaded_from_store() {
    let client = MockTokenClient::new();
    let keychain = configured_keychain();
    let expires_at = Utc::now() + ChronoDuration::minutes(20);
    keychain.set(CredentialKey::Token, "stored-token").unwrap();
    keychain.set(CredentialKey::TokenExpiration, &expires_at.to_rfc3339()).unwrap();
    let manager = manager(&client, &keychain);

    let token = manager.ensure_valid_token().await.unwrap();

    assert_eq!(token.value, "stored-token");
    assert_eq!(client.call_count(), 0);
}

/// Validates that a persisted token inside the refresh leeway is replaced.
#[tokio::test(flavor = "multi_thread")]
async fn test_expiring_persisted_token_is_refreshed() {
    let client = MockTokenClient::new();
    let keychain = configured_keychain();
    let expires_at = Utc::now() + ChronoDuration::seconds(10);
    keychain.set(CredentialKey::Token, "stale-token").unwrap();
    keychain.set(CredentialKey::TokenExpiration, &expires_at.to_rfc3339()).unwrap();
    let manager = manager(&client, &keychain);

    let token = manager.ensure_valid_token().await.unwrap();

    assert_ne!(token.value, "stale-token");
    assert_eq!(client.call_count(), 1);
}

/// Validates that a forced refresh replaces the rejected token once, even
/// when several callers report the same stale token.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_force_refresh_is_single_flight_per_stale_token() {
    let client = MockTokenClient::new();
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);
    let stale = manager.ensure_valid_token().await.unwrap();
    client.set_delay(Duration::from_millis(50));

    let handles = (0..4).map(|_| {
        let manager = Arc::clone(&manager);
        let stale = stale.clone();
        tokio::spawn(async move { manager.force_refresh(&stale).await })
    });
    let replaced: Vec<AccessToken> =
        join_all(handles).await.into_iter().map(|joined| joined.unwrap().unwrap()).collect();

    assert_eq!(client.call_count(), 2);
    assert!(replaced.iter().all(|token| token.value != stale.value && token == &replaced[0]));
}

/// Validates that a token expiring within the leeway is rejected.
#[tokio::test(flavor = "multi_thread")]
async fn test_short_lived_token_is_rejected() {
    let client = MockTokenClient::new();
    client.set_lifetime(5);
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let err = manager.ensure_valid_token().await.unwrap_err();

    assert!(matches!(err, PatcherError::TokenLifetime { .. }));
    assert!(manager.current_token().await.is_none());
    assert!(!keychain.contains(CredentialKey::Token));
}

/// Validates that a lifetime too large to yield an expiry is rejected
/// instead of overflowing.
#[tokio::test(flavor = "multi_thread")]
async fn test_unrepresentable_lifetime_is_rejected() {
    let client = MockTokenClient::new();
    client.set_lifetime(i64::MAX);
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let err = manager.ensure_valid_token().await.unwrap_err();

    assert_eq!(err, PatcherError::token_lifetime(i64::MAX));
    assert!(manager.current_token().await.is_none());
    assert!(!keychain.contains(CredentialKey::Token));
}

/// Validates that missing client credentials surface as a token fetch error
/// without contacting the server.
#[tokio::test(flavor = "multi_thread")]
async fn test_missing_credentials_fail_without_network() {
    let client = MockTokenClient::new();
    let keychain =
        MockKeychainProvider::with_entries([(CredentialKey::Url, "https://jamf.example.com")]);
    let manager = manager(&client, &keychain);

    let err = manager.ensure_valid_token().await.unwrap_err();

    assert_eq!(err, PatcherError::token_fetch("missing client_id credential"));
    assert_eq!(client.call_count(), 0);
}

/// Validates that grant failures propagate unchanged and leave no token
/// cached, so the next call tries again.
#[tokio::test(flavor = "multi_thread")]
async fn test_grant_failure_propagates_and_recovers() {
    let client = MockTokenClient::new();
    client.set_failure(Some(PatcherError::token_fetch("500 - upstream down")));
    let keychain = configured_keychain();
    let manager = manager(&client, &keychain);

    let err = manager.ensure_valid_token().await.unwrap_err();
    assert_eq!(err, PatcherError::token_fetch("500 - upstream down"));
    assert!(manager.current_token().await.is_none());

    client.set_failure(None);
    assert!(manager.ensure_valid_token().await.is_ok());
    assert_eq!(client.call_count(), 2);
}
