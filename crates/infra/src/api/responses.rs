//! Wire shapes of the management API and the release feed

use chrono::{DateTime, NaiveDate};
use patcher_domain::{PatchSummary, ReleaseEntry};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Entry of the patch software title configuration listing.
#[derive(Debug, Deserialize)]
pub struct PolicyRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

/// Patch summary of one software title configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummaryResponse {
    pub title: String,
    pub release_date: String,
    #[serde(default)]
    pub up_to_date: u64,
    #[serde(default)]
    pub out_of_date: u64,
}

impl PatchSummaryResponse {
    /// `None` when the release date cannot be read.
    pub fn into_summary(self) -> Option<PatchSummary> {
        let released = parse_release_date(&self.release_date)?;
        Some(PatchSummary::from_counts(self.title, released, self.up_to_date, self.out_of_date))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceListResponse {
    pub results: Vec<DeviceListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceListEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetailResponse {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
}

/// SOFA release feed (`OSVersions[].Latest`).
#[derive(Debug, Deserialize)]
pub struct ReleaseFeed {
    #[serde(rename = "OSVersions")]
    pub os_versions: Vec<FeedOsVersion>,
}

#[derive(Debug, Deserialize)]
pub struct FeedOsVersion {
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    #[serde(rename = "Latest")]
    pub latest: FeedLatest,
}

#[derive(Debug, Deserialize)]
pub struct FeedLatest {
    #[serde(rename = "ProductVersion")]
    pub product_version: String,
    #[serde(rename = "ReleaseDate")]
    pub release_date: String,
}

impl FeedOsVersion {
    /// Catalog entry, or a description of the field that could not be read.
    pub fn into_entry(self) -> Result<ReleaseEntry, String> {
        let os_major_version = leading_number(&self.os_version)
            .ok_or_else(|| format!("unreadable OSVersion '{}'", self.os_version))?;
        let release_date = parse_release_date(&self.latest.release_date)
            .ok_or_else(|| format!("unreadable ReleaseDate '{}'", self.latest.release_date))?;

        Ok(ReleaseEntry {
            os_major_version,
            product_version: self.latest.product_version,
            release_date,
        })
    }
}

/// Reads RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| raw.get(..10).and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()))
}

// "17" and "iOS 17" both carry major version 17.
fn leading_number(raw: &str) -> Option<u32> {
    raw.split(|c: char| !c.is_ascii_digit()).find(|part| !part.is_empty())?.parse().ok()
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("unexpected id {other}"))),
    }
}
