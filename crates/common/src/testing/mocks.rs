//! Mock implementations of the auth and security traits

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use patcher_domain::{CredentialKey, PatcherError};

use crate::auth::{AccessToken, ClientCredentials, TokenClient};
use crate::security::{CredentialStore, KeychainError};

/// In-memory credential store.
///
/// Clones share the same storage, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MockKeychainProvider {
    storage: Arc<Mutex<HashMap<CredentialKey, String>>>,
    failing_deletes: Arc<Mutex<HashSet<CredentialKey>>>,
}

impl MockKeychainProvider {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (CredentialKey, &'a str)>) -> Self {
        let store = Self::new();
        store.storage.lock().extend(entries.into_iter().map(|(k, v)| (k, v.to_string())));
        store
    }

    /// Make `delete` fail for `key`.
    pub fn fail_delete(&self, key: CredentialKey) {
        self.failing_deletes.lock().insert(key);
    }

    /// Whether a value is stored for `key`.
    #[must_use]
    pub fn contains(&self, key: CredentialKey) -> bool {
        self.storage.lock().contains_key(&key)
    }

    /// Stored value for `key`, bypassing the trait.
    #[must_use]
    pub fn value(&self, key: CredentialKey) -> Option<String> {
        self.storage.lock().get(&key).cloned()
    }
}

impl CredentialStore for MockKeychainProvider {
    fn set(&self, key: CredentialKey, value: &str) -> Result<(), KeychainError> {
        self.storage.lock().insert(key, value.to_string());
        Ok(())
    }

    fn get(&self, key: CredentialKey) -> Result<Option<String>, KeychainError> {
        Ok(self.storage.lock().get(&key).cloned())
    }

    fn delete(&self, key: CredentialKey) -> Result<(), KeychainError> {
        if self.failing_deletes.lock().contains(&key) {
            return Err(KeychainError::AccessFailed(format!("refusing to delete {key}")));
        }
        self.storage.lock().remove(&key);
        Ok(())
    }
}

/// Token client that returns scripted tokens without network calls.
#[derive(Clone, Debug)]
pub struct MockTokenClient {
    calls: Arc<AtomicUsize>,
    lifetime_secs: Arc<Mutex<i64>>,
    failure: Arc<Mutex<Option<PatcherError>>>,
    delay: Arc<Mutex<Duration>>,
}

impl MockTokenClient {
    /// Client issuing one-hour tokens.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            lifetime_secs: Arc::new(Mutex::new(3600)),
            failure: Arc::new(Mutex::new(None)),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Lifetime of subsequently issued tokens.
    pub fn set_lifetime(&self, secs: i64) {
        *self.lifetime_secs.lock() = secs;
    }

    /// Fail every subsequent grant with `error`.
    pub fn set_failure(&self, error: Option<PatcherError>) {
        *self.failure.lock() = error;
    }

    /// Sleep this long before answering, to widen race windows.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Number of grants performed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTokenClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenClient for MockTokenClient {
    async fn client_credentials(
        &self,
        _credentials: &ClientCredentials,
    ) -> Result<AccessToken, PatcherError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        let lifetime = *self.lifetime_secs.lock();
        AccessToken::with_lifetime(format!("mock-token-{call}"), lifetime, Utc::now())
    }
}
