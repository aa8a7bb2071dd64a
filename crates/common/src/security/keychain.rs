//! Keychain-backed credential storage
//!
//! A thin wrapper over the platform keychain holding the five Patcher
//! secrets (server URL, client id, client secret, bearer token and its
//! expiry) under a single service name. Each [`CredentialKey`] maps to one
//! keychain account.
//!
//! ## Usage
//!
//! ```no_run
//! use patcher_common::security::{CredentialStore, KeychainProvider};
//! use patcher_domain::CredentialKey;
//!
//! let keychain = KeychainProvider::new("Patcher");
//! keychain.set(CredentialKey::Url, "https://example.jamfcloud.com")?;
//! let url = keychain.get(CredentialKey::Url)?;
//! assert_eq!(url.as_deref(), Some("https://example.jamfcloud.com"));
//! # Ok::<(), patcher_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use patcher_domain::{CredentialKey, PatcherError};
use thiserror::Error;
use tracing::debug;

/// Trait for credential storage
///
/// Abstracts the keychain so the token manager and setup flow can be tested
/// with an in-memory store.
pub trait CredentialStore: Send + Sync {
    /// Store or overwrite a secret
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the backend rejects the write
    fn set(&self, key: CredentialKey, value: &str) -> Result<(), KeychainError>;

    /// Retrieve a secret, `None` when it was never stored
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the backend cannot be read
    fn get(&self, key: CredentialKey) -> Result<Option<String>, KeychainError>;

    /// Remove a secret (idempotent)
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the entry exists but could not
    /// be removed
    fn delete(&self, key: CredentialKey) -> Result<(), KeychainError>;
}

/// Platform keychain provider
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Examples
    /// ```
    /// use patcher_common::security::KeychainProvider;
    ///
    /// let keychain = KeychainProvider::new("Patcher");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service name every entry is stored under
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret value in the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })?;

        debug!(service = %self.service_name, key = %key, "Secret stored successfully");
        Ok(())
    }

    /// Retrieve a secret value from the platform keychain
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if secret doesn't exist
    /// Returns `KeychainError::AccessFailed` if keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| {
            if matches!(e, keyring::Error::NoEntry) {
                KeychainError::NotFound
            } else {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {key}: {e}"))
            }
        })
    }

    /// Delete a secret from the platform keychain (idempotent)
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the entry could not be removed
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service_name, key = %key, "Secret deleted");
                Ok(())
            }
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

impl CredentialStore for KeychainProvider {
    fn set(&self, key: CredentialKey, value: &str) -> Result<(), KeychainError> {
        self.set_secret(key.as_str(), value)
    }

    fn get(&self, key: CredentialKey) -> Result<Option<String>, KeychainError> {
        match self.get_secret(key.as_str()) {
            Ok(secret) => Ok(Some(secret)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&self, key: CredentialKey) -> Result<(), KeychainError> {
        self.delete_secret(key.as_str())
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,
}

impl From<KeychainError> for PatcherError {
    fn from(err: KeychainError) -> Self {
        Self::keychain(err.to_string())
    }
}
