//! Credential storage

pub mod keychain;

pub use keychain::{CredentialStore, KeychainError, KeychainProvider};
