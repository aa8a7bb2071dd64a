//! Port interfaces for the report pipeline
//!
//! These traits define the boundaries between the pipeline and the
//! management API client and report writers in the infrastructure layer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use patcher_domain::{DeviceRecord, PatchSummary, PolicyId, ReleaseEntry, Result};

/// Source of fleet patch data
#[async_trait]
pub trait PatchDataSource: Send + Sync {
    /// Ids of every patch software title configuration
    async fn get_policies(&self) -> Result<Vec<PolicyId>>;

    /// Patch summary per policy id, in input order
    async fn get_summaries(&self, policy_ids: &[PolicyId]) -> Result<Vec<PatchSummary>>;

    /// Ids of every mobile device
    async fn get_device_ids(&self) -> Result<Vec<String>>;

    /// OS version reported by each device; unreadable devices are skipped
    async fn get_device_os_versions(&self, device_ids: &[String]) -> Result<Vec<DeviceRecord>>;

    /// Latest release per OS major version
    async fn get_release_feed(&self) -> Result<Vec<ReleaseEntry>>;

    /// Server the data comes from, used as error context
    fn server_url(&self) -> Option<String> {
        None
    }
}

/// Writer turning the final record set into a report artifact
pub trait ReportExporter: Send + Sync {
    /// Write `reports` into `output_dir` and return the created file
    fn export(&self, reports: &[PatchSummary], output_dir: &Path) -> Result<PathBuf>;
}
