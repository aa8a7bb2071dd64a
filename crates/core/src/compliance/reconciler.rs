//! Version reconciliation
//!
//! Cross-references the OS version each device reported with the latest
//! release per major version and counts how many devices run it.

use std::collections::HashMap;

use patcher_domain::{completion_percent, ComplianceRow, DeviceRecord, ReleaseEntry};

/// Compute one compliance row per catalog entry that has devices.
///
/// Devices are grouped by the leading numeric component of their OS version.
/// For every catalog entry whose major version has at least one device, the
/// row counts the devices whose full version equals the entry's product
/// version. Rows follow catalog order and are titled
/// `"<platform> <product_version>"`.
///
/// Devices on a major version missing from the catalog, and catalog entries
/// without devices, produce no row.
#[must_use]
pub fn reconcile(
    devices: &[DeviceRecord],
    catalog: &[ReleaseEntry],
    platform: &str,
) -> Vec<ComplianceRow> {
    let mut by_major: HashMap<u32, Vec<&str>> = HashMap::new();
    for device in devices {
        if let Some(major) = device.major_version() {
            by_major.entry(major).or_default().push(device.os_version.trim());
        }
    }

    catalog
        .iter()
        .filter_map(|entry| {
            let versions = by_major.get(&entry.os_major_version)?;
            let total_hosts = versions.len() as u64;
            let hosts_patched =
                versions.iter().filter(|version| **version == entry.product_version).count() as u64;

            Some(ComplianceRow {
                software_title: format!("{platform} {}", entry.product_version),
                patch_released: entry.release_date,
                hosts_patched,
                missing_patch: total_hosts - hosts_patched,
                completion_percent: completion_percent(hosts_patched, total_hosts),
                total_hosts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(major: u32, product: &str, (y, m, d): (i32, u32, u32)) -> ReleaseEntry {
        ReleaseEntry {
            os_major_version: major,
            product_version: product.to_string(),
            release_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn catalog() -> Vec<ReleaseEntry> {
        vec![entry(17, "17.5.1", (2024, 5, 20)), entry(16, "16.7.8", (2024, 5, 13))]
    }

    fn devices(versions: &[&str]) -> Vec<DeviceRecord> {
        versions
            .iter()
            .enumerate()
            .map(|(id, os)| DeviceRecord::new((id + 1).to_string(), *os))
            .collect()
    }

    #[test]
    fn counts_devices_on_latest_per_major() {
        let rows = reconcile(&devices(&["17.5.1", "16.7.8", "17.5.1"]), &catalog(), "iOS");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].software_title, "iOS 17.5.1");
        assert_eq!(rows[0].patch_released, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        assert_eq!((rows[0].hosts_patched, rows[0].missing_patch, rows[0].total_hosts), (2, 0, 2));
        assert_eq!(rows[0].completion_percent, 100.0);
        assert_eq!(rows[1].software_title, "iOS 16.7.8");
        assert_eq!((rows[1].hosts_patched, rows[1].missing_patch, rows[1].total_hosts), (1, 0, 1));
    }

    #[test]
    fn devices_behind_latest_count_as_missing() {
        let rows = reconcile(&devices(&["17.4.0", "16.6.0"]), &catalog(), "iOS");

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!((row.hosts_patched, row.missing_patch, row.total_hosts), (0, 1, 1));
            assert_eq!(row.completion_percent, 0.0);
        }
    }

    #[test]
    fn partial_adoption_is_rounded() {
        let rows = reconcile(&devices(&["17.5.1", "17.4.0", "17.3"]), &catalog(), "iOS");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hosts_patched, 1);
        assert_eq!(rows[0].missing_patch, 2);
        assert_eq!(rows[0].completion_percent, 33.33);
    }

    #[test]
    fn catalog_entries_without_devices_produce_no_row() {
        let rows = reconcile(&devices(&["17.5.1"]), &catalog(), "iOS");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].software_title, "iOS 17.5.1");
    }

    #[test]
    fn majors_missing_from_catalog_are_dropped() {
        let rows = reconcile(&devices(&["15.8.2", "15.8.1"]), &catalog(), "iOS");
        assert!(rows.is_empty());
    }

    #[test]
    fn unparseable_versions_are_ignored() {
        let rows = reconcile(&devices(&["", "unknown", "17.5.1"]), &catalog(), "iOS");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_hosts, 1);
    }

    #[test]
    fn empty_inputs_yield_no_rows() {
        assert!(reconcile(&[], &catalog(), "iOS").is_empty());
        assert!(reconcile(&devices(&["17.5.1"]), &[], "iOS").is_empty());
    }

    #[test]
    fn rows_follow_catalog_order() {
        let mut reversed = catalog();
        reversed.reverse();
        let rows = reconcile(&devices(&["17.5.1", "16.7.8"]), &reversed, "iPadOS");

        let titles: Vec<_> = rows.iter().map(|row| row.software_title.as_str()).collect();
        assert_eq!(titles, ["iPadOS 16.7.8", "iPadOS 17.5.1"]);
    }
}
