//! Domain types and models
//!
//! Everything a report run produces or consumes: policy ids, patch summaries,
//! device observations, release catalog entries and compliance rows.

pub mod credentials;
pub mod device;
pub mod patch;
pub mod release;

pub use credentials::CredentialKey;
pub use device::DeviceRecord;
pub use patch::{completion_percent, PatchSummary, PolicyId, SortKey};
pub use release::{ComplianceRow, ReleaseEntry};
