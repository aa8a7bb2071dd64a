//! Shared auth and credential infrastructure for Patcher crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `platform`: keychain storage, OAuth client and token manager
//! - `native-keychain`: back the keychain with the OS credential vault
//! - `test-utils`: in-memory mocks of the traits in this crate

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

#[cfg(feature = "platform")]
pub use auth::{AccessToken, ClientCredentials, OAuthClient, TokenClient, TokenManager};
#[cfg(feature = "platform")]
pub use security::{CredentialStore, KeychainError, KeychainProvider};
