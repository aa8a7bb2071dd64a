//! # Patcher Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The Jamf Pro API client and SOFA release feed reader
//! - The setup flow and its plist completion marker
//! - Configuration loading and persistence
//! - Report writers
//!
//! ## Architecture
//! - Implements traits defined in `patcher-core`
//! - Depends on `patcher-common`, `patcher-domain` and `patcher-core`
//! - Contains all "impure" code (network, filesystem)

pub mod api;
pub mod config;
pub mod export;
pub mod http;
pub mod setup;

// Re-export commonly used items
pub use api::{AccessTokenProvider, JamfClient};
pub use export::JsonReportExporter;
pub use http::{HttpClient, HttpClientBuilder, HttpError};
pub use setup::{PlistMarker, SetupOptions, SetupOrchestrator, SetupOutcome, SetupState};
