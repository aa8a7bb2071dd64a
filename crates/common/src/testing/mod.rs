//! Testing utilities and helpers
//!
//! - **[`mocks`]**: In-memory credential store and scripted token client
//!
//! ## Usage
//!
//! ```rust
//! use patcher_common::security::CredentialStore;
//! use patcher_common::testing::MockKeychainProvider;
//! use patcher_domain::CredentialKey;
//!
//! let keychain = MockKeychainProvider::default();
//! keychain.set(CredentialKey::ClientId, "abc").unwrap();
//! assert!(keychain.contains(CredentialKey::ClientId));
//! ```

pub mod mocks;

pub use mocks::{MockKeychainProvider, MockTokenClient};
