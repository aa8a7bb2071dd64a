//! Application constants
//!
//! Centralized location for endpoint paths and fixed values used when talking
//! to the management API and the release feed.

// Management API: authentication
pub const BASIC_TOKEN_PATH: &str = "/api/v1/auth/token";
pub const OAUTH_TOKEN_PATH: &str = "/api/oauth/token";

// Management API: provisioning
pub const API_ROLES_PATH: &str = "/api/v1/api-roles";
pub const API_INTEGRATIONS_PATH: &str = "/api/v1/api-integrations";

// Management API: reporting
pub const PATCH_TITLES_PATH: &str = "/api/v2/patch-software-title-configurations";
pub const MOBILE_DEVICES_PATH: &str = "/api/v2/mobile-devices";

// Release feed
pub const SOFA_IOS_FEED_URL: &str = "https://sofa.macadmins.io/v1/ios_data_feed.json";
pub const IOS_PLATFORM_LABEL: &str = "iOS";

// Provisioned role/client
pub const API_ROLE_NAME: &str = "Patcher-Role";
pub const API_CLIENT_NAME: &str = "Patcher-Client";
pub const API_CLIENT_TOKEN_LIFETIME_SECS: u64 = 1800;

/// Privileges granted to the provisioned API role.
///
/// Read-only patch/inventory scopes plus what is needed to manage the role and
/// client themselves.
pub const API_ROLE_PRIVILEGES: &[&str] = &[
    "Read Patch Management Software Titles",
    "Read Patch Policies",
    "Read Mobile Devices",
    "Read Mobile Device Inventory Collection",
    "Read Mobile Device Applications",
    "Read Patch Management Settings",
    "Create API Integrations",
    "Create API Roles",
    "Read API Integrations",
    "Read API Roles",
    "Update API Integrations",
    "Update API Roles",
    "Delete API Integrations",
    "Delete API Roles",
];

// Report pipeline
pub const REPORTS_DIR_NAME: &str = "Patch-Reports";
pub const OMIT_RECENT_HOURS: i64 = 48;
pub const PATCH_DATE_FORMAT: &str = "%b %d %Y";

// Local state
pub const APP_DIR_NAME: &str = "Patcher";
pub const KEYCHAIN_SERVICE: &str = "Patcher";
pub const MARKER_FILE_NAME: &str = "patcher.plist";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = "patcher.log";

// Network
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_TOKEN_REFRESH_LEEWAY_SECS: i64 = 30;
