//! Release catalog entries and reconciled compliance rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patch::{patch_date, PatchSummary};

/// Latest product version published for one OS major version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub os_major_version: u32,
    pub product_version: String,
    #[serde(with = "patch_date")]
    pub release_date: NaiveDate,
}

/// Per-release device adoption statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRow {
    pub software_title: String,
    #[serde(with = "patch_date")]
    pub patch_released: NaiveDate,
    pub hosts_patched: u64,
    pub missing_patch: u64,
    pub completion_percent: f64,
    pub total_hosts: u64,
}

impl From<ComplianceRow> for PatchSummary {
    fn from(row: ComplianceRow) -> Self {
        Self {
            software_title: row.software_title,
            patch_released: row.patch_released,
            hosts_patched: row.hosts_patched,
            missing_patch: row.missing_patch,
            completion_percent: row.completion_percent,
            total_hosts: row.total_hosts,
        }
    }
}
