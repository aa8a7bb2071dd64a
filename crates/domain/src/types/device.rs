//! Mobile device observations

use serde::{Deserialize, Serialize};

/// A device id paired with the OS version it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    pub serial_number: Option<String>,
    pub os_version: String,
}

impl DeviceRecord {
    pub fn new(device_id: impl Into<String>, os_version: impl Into<String>) -> Self {
        Self { device_id: device_id.into(), serial_number: None, os_version: os_version.into() }
    }

    /// Leading numeric component of the OS version (`"17.5.1"` → `17`).
    #[must_use]
    pub fn major_version(&self) -> Option<u32> {
        self.os_version.trim().split('.').next().and_then(|major| major.parse().ok())
    }
}
