//! Management API access

pub mod auth;
pub mod client;
pub mod responses;

pub use auth::AccessTokenProvider;
pub use client::JamfClient;
