//! Error types used throughout the application
//!
//! Every variant renders as its default message followed by the contextual
//! details that are present, e.g.
//! `Unable to fetch bearer token - reason: 500 - upstream down`.
//! Errors are plain values; logging and console output belong to the caller.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Patcher
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatcherError {
    #[error("Unable to fetch bearer token{}", detail("reason", .reason))]
    TokenFetch { reason: Option<String> },

    #[error("Token lifetime is too short{}", detail("lifetime", .lifetime))]
    TokenLifetime { lifetime: Option<i64> },

    #[error("Unable to complete Setup{}", detail("reason", .reason))]
    Setup { reason: Option<String> },

    #[error("API call unsuccessful{}", detail("reason", .reason))]
    ApiResponse { reason: Option<String> },

    #[error(
        "Unable to remove all credentials from keychain{}",
        detail_list("credentials", .credentials)
    )]
    CredentialDeletion { credentials: Vec<String> },

    #[error("Error obtaining policy information from Jamf instance{}", detail("url", .url))]
    PolicyFetch { url: Option<String> },

    #[error("Error obtaining patch summaries from Jamf instance{}", detail("url", .url))]
    SummaryFetch { url: Option<String> },

    #[error("Error retrieving device IDs from Jamf instance{}", detail("reason", .reason))]
    DeviceIdFetch { reason: Option<String> },

    #[error("Error retrieving OS information from Jamf instance{}", detail("reason", .reason))]
    DeviceOsFetch { reason: Option<String> },

    #[error("Unable to fetch SOFA feed{}{}", detail("reason", .reason), detail("url", .url))]
    SofaFeed { reason: Option<String>, url: Option<String> },

    #[error("Invalid column name for sorting{}", detail("column", .column))]
    Sort { column: Option<String> },

    #[error("Error creating directory{}", detail("path", .path))]
    DirectoryCreation { path: Option<String> },

    #[error("Error exporting data{}", detail("file_path", .file_path))]
    Export { file_path: Option<String> },

    #[error("Unable to interact with plist{}", detail("path", .path))]
    Plist { path: Option<String> },

    #[error("Keychain operation failed{}", detail("reason", .reason))]
    Keychain { reason: Option<String> },

    #[error("Invalid configuration{}", detail("reason", .reason))]
    Config { reason: Option<String> },
}

impl PatcherError {
    pub fn token_fetch(reason: impl Into<String>) -> Self {
        Self::TokenFetch { reason: Some(reason.into()) }
    }

    pub fn token_lifetime(lifetime: i64) -> Self {
        Self::TokenLifetime { lifetime: Some(lifetime) }
    }

    pub fn setup(reason: impl Into<String>) -> Self {
        Self::Setup { reason: Some(reason.into()) }
    }

    pub fn api_response(reason: impl Into<String>) -> Self {
        Self::ApiResponse { reason: Some(reason.into()) }
    }

    pub fn device_id_fetch(reason: impl Into<String>) -> Self {
        Self::DeviceIdFetch { reason: Some(reason.into()) }
    }

    pub fn device_os_fetch(reason: impl Into<String>) -> Self {
        Self::DeviceOsFetch { reason: Some(reason.into()) }
    }

    pub fn sofa_feed(reason: impl Into<String>, url: impl Into<String>) -> Self {
        Self::SofaFeed { reason: Some(reason.into()), url: Some(url.into()) }
    }

    pub fn keychain(reason: impl Into<String>) -> Self {
        Self::Keychain { reason: Some(reason.into()) }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: Some(reason.into()) }
    }

    /// Stable label suitable for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenFetch { .. } => "token_fetch",
            Self::TokenLifetime { .. } => "token_lifetime",
            Self::Setup { .. } => "setup",
            Self::ApiResponse { .. } => "api_response",
            Self::CredentialDeletion { .. } => "credential_deletion",
            Self::PolicyFetch { .. } => "policy_fetch",
            Self::SummaryFetch { .. } => "summary_fetch",
            Self::DeviceIdFetch { .. } => "device_id_fetch",
            Self::DeviceOsFetch { .. } => "device_os_fetch",
            Self::SofaFeed { .. } => "sofa_feed",
            Self::Sort { .. } => "sort",
            Self::DirectoryCreation { .. } => "directory_creation",
            Self::Export { .. } => "export",
            Self::Plist { .. } => "plist",
            Self::Keychain { .. } => "keychain",
            Self::Config { .. } => "config",
        }
    }

    /// Contextual key/value details carried by this error.
    pub fn details(&self) -> Vec<(&'static str, String)> {
        fn opt<T: Display>(key: &'static str, value: &Option<T>) -> Vec<(&'static str, String)> {
            value.iter().map(|v| (key, v.to_string())).collect()
        }

        match self {
            Self::TokenFetch { reason }
            | Self::Setup { reason }
            | Self::ApiResponse { reason }
            | Self::DeviceIdFetch { reason }
            | Self::DeviceOsFetch { reason }
            | Self::Keychain { reason }
            | Self::Config { reason } => opt("reason", reason),
            Self::TokenLifetime { lifetime } => opt("lifetime", lifetime),
            Self::CredentialDeletion { credentials } if credentials.is_empty() => Vec::new(),
            Self::CredentialDeletion { credentials } => {
                vec![("credentials", credentials.join(", "))]
            }
            Self::PolicyFetch { url } | Self::SummaryFetch { url } => opt("url", url),
            Self::SofaFeed { reason, url } => {
                let mut details = opt("reason", reason);
                details.extend(opt("url", url));
                details
            }
            Self::Sort { column } => opt("column", column),
            Self::DirectoryCreation { path } | Self::Plist { path } => opt("path", path),
            Self::Export { file_path } => opt("file_path", file_path),
        }
    }
}

fn detail<T: Display>(key: &str, value: &Option<T>) -> String {
    value.as_ref().map(|v| format!(" - {key}: {v}")).unwrap_or_default()
}

fn detail_list(key: &str, values: &[String]) -> String {
    if values.is_empty() {
        String::new()
    } else {
        format!(" - {key}: {}", values.join(", "))
    }
}

/// Result type alias for Patcher operations
pub type Result<T> = std::result::Result<T, PatcherError>;
