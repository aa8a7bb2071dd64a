//! Bearer token infrastructure
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  Token lifecycle + single-flight refresh
//! └────────┬────────┘
//!          │
//!          ├──► TokenClient        (client-credentials grant, OAuthClient)
//!          │
//!          └──► CredentialStore    (KeychainProvider)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use patcher_common::auth::{OAuthClient, TokenManager};
//! use patcher_common::security::KeychainProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(OAuthClient::new(Duration::from_secs(30))?);
//!     let keychain = Arc::new(KeychainProvider::new("Patcher"));
//!     let manager = TokenManager::new(client, keychain, 30);
//!
//!     let token = manager.ensure_valid_token().await?;
//!     println!("Token valid until {}", token.expires_at);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::OAuthClient;
pub use token_manager::TokenManager;
pub use traits::TokenClient;
pub use types::{parse_token_response, AccessToken, ClientCredentials};
