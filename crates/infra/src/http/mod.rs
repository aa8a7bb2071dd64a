//! Outbound HTTP plumbing shared by the API client and setup flow

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpError};
