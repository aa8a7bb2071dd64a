//! Ordering and filtering of the working record set

use chrono::{Duration, NaiveDateTime};
use patcher_domain::constants::OMIT_RECENT_HOURS;
use patcher_domain::{PatchSummary, SortKey};

/// Sort records ascending on `key`, keeping the input order of ties.
pub fn sort_reports(reports: &mut [PatchSummary], key: SortKey) {
    reports.sort_by(|a, b| key.compare(a, b));
}

/// Drop records whose patch was released within the last 48 hours of `now`.
///
/// A release date counts from midnight, so only records released strictly
/// before the cutoff are kept.
#[must_use]
pub fn omit_recent(reports: Vec<PatchSummary>, now: NaiveDateTime) -> Vec<PatchSummary> {
    let cutoff = now - Duration::hours(OMIT_RECENT_HOURS);
    reports
        .into_iter()
        .filter(|report| report.patch_released.and_time(chrono::NaiveTime::MIN) < cutoff)
        .collect()
}
