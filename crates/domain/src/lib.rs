//! # Patcher Domain
//!
//! Business domain types and models for Patcher.
//!
//! This crate contains:
//! - Patch summary, device and release catalog types
//! - The error taxonomy shared by every layer
//! - Configuration structures
//! - Endpoint paths and other fixed values
//!
//! ## Architecture
//! - No dependencies on other Patcher crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
