//! Patch summary records and report column handling

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;
use crate::PatcherError;

/// Server-assigned identifier of a patch software title configuration.
pub type PolicyId = String;

/// One row of the patch report.
///
/// Produced per policy id from the management API's patch summary, and also
/// from reconciled iOS compliance rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSummary {
    pub software_title: String,
    #[serde(with = "patch_date")]
    pub patch_released: NaiveDate,
    pub hosts_patched: u64,
    pub missing_patch: u64,
    pub completion_percent: f64,
    pub total_hosts: u64,
}

impl PatchSummary {
    /// Build a record from up-to-date / out-of-date host counts.
    pub fn from_counts(
        software_title: impl Into<String>,
        patch_released: NaiveDate,
        hosts_patched: u64,
        missing_patch: u64,
    ) -> Self {
        let total_hosts = hosts_patched + missing_patch;
        Self {
            software_title: software_title.into(),
            patch_released,
            hosts_patched,
            missing_patch,
            completion_percent: completion_percent(hosts_patched, total_hosts),
            total_hosts,
        }
    }
}

/// Percentage of `patched` over `total`, rounded to two decimals.
///
/// Returns `0.0` when `total` is zero.
#[must_use]
pub fn completion_percent(patched: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = patched as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Columns a report can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    SoftwareTitle,
    PatchReleased,
    HostsPatched,
    MissingPatch,
    CompletionPercent,
    TotalHosts,
}

impl_domain_enum_conversions!(SortKey {
    SoftwareTitle => "software_title",
    PatchReleased => "patch_released",
    HostsPatched => "hosts_patched",
    MissingPatch => "missing_patch",
    CompletionPercent => "completion_percent",
    TotalHosts => "total_hosts",
});

impl SortKey {
    /// Parse a user supplied column name such as `"Hosts Patched"`.
    ///
    /// # Errors
    /// Returns [`PatcherError::Sort`] naming the column in title case when it
    /// does not match any report column.
    pub fn parse_column(raw: &str) -> Result<Self, PatcherError> {
        let normalized = raw.trim().to_lowercase().replace(' ', "_");
        Self::from_str(&normalized)
            .map_err(|_| PatcherError::Sort { column: Some(title_case(&normalized)) })
    }

    /// Ascending comparison of two records on this column.
    pub fn compare(self, a: &PatchSummary, b: &PatchSummary) -> Ordering {
        match self {
            Self::SoftwareTitle => a.software_title.cmp(&b.software_title),
            Self::PatchReleased => a.patch_released.cmp(&b.patch_released),
            Self::HostsPatched => a.hosts_patched.cmp(&b.hosts_patched),
            Self::MissingPatch => a.missing_patch.cmp(&b.missing_patch),
            Self::CompletionPercent => a.completion_percent.total_cmp(&b.completion_percent),
            Self::TotalHosts => a.total_hosts.cmp(&b.total_hosts),
        }
    }
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serde helpers rendering report dates as `May 20 2024`.
pub mod patch_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::PATCH_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(PATCH_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, PATCH_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
