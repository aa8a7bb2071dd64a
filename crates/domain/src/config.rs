//! Configuration management
//!
//! A fixed, typed field set loaded once at startup and passed by reference to
//! the components that need it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_REFRESH_LEEWAY_SECS,
    CONFIG_FILE_NAME, LOG_DIR_NAME, MARKER_FILE_NAME, SOFA_IOS_FEED_URL,
};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub report: ReportSettings,
    pub paths: PathSettings,
}

/// Network behaviour of the API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Timeout applied to every outbound request
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent per-id requests (summaries, device details)
    pub max_concurrency: usize,
    /// A cached token is treated as expired this many seconds early
    pub token_refresh_leeway_secs: i64,
    /// Release feed consulted for the latest iOS versions
    pub sofa_feed_url: String,
}

impl ApiSettings {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            token_refresh_leeway_secs: DEFAULT_TOKEN_REFRESH_LEEWAY_SECS,
            sofa_feed_url: SOFA_IOS_FEED_URL.to_string(),
        }
    }
}

/// Text and typography used by report renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub header_text: String,
    pub footer_text: String,
    pub font_name: String,
    pub font_regular_path: Option<PathBuf>,
    pub font_bold_path: Option<PathBuf>,
    /// Date format used in report headers
    pub date_format: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            header_text: "Default header text".to_string(),
            footer_text: "Default footer text".to_string(),
            font_name: "Assistant".to_string(),
            font_regular_path: None,
            font_bold_path: None,
            date_format: "%B %d %Y".to_string(),
        }
    }
}

/// Local filesystem layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Application support directory; resolved by the loader when unset
    pub support_dir: Option<PathBuf>,
}

impl PathSettings {
    /// Support directory, falling back to the working directory.
    #[must_use]
    pub fn support_dir(&self) -> &Path {
        self.support_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.support_dir().join(MARKER_FILE_NAME)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.support_dir().join(CONFIG_FILE_NAME)
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.support_dir().join(LOG_DIR_NAME)
    }
}
