//! # Patcher Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The version reconciler computing iOS adoption rows
//! - The report pipeline service
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `patcher-domain`
//! - No HTTP, keychain or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod compliance;
pub mod report;
pub mod setup;

pub use compliance::reconcile;
pub use report::ports::{PatchDataSource, ReportExporter};
pub use report::{ReportRequest, ReportService};
pub use setup::ports::{CompletionMarker, Prompter};
