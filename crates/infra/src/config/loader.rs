//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Use the explicitly given file, if any
//! 2. Otherwise probe the support directory and the working directory
//! 3. Fall back to built-in defaults when no file exists
//! 4. Apply `PATCHER_*` environment overrides on top
//!
//! Setup writes back to the file that was loaded, so a working-directory
//! config stays authoritative.
//!
//! ## Environment Variables
//! - `PATCHER_SUPPORT_DIR`: Directory holding config, marker and logs
//! - `PATCHER_REQUEST_TIMEOUT`: Per-request timeout in seconds
//! - `PATCHER_MAX_CONCURRENCY`: Concurrent per-id requests
//! - `PATCHER_SOFA_FEED_URL`: Release feed URL
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `<support_dir>/config.toml` or `<support_dir>/config.json`
//! 2. `./patcher.toml` or `./patcher.json` (current working directory)

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use patcher_domain::constants::APP_DIR_NAME;
use patcher_domain::{Config, PatcherError, Result};

/// Configuration together with the file setup writes it back to
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the configuration was read from, or `<support_dir>/config.toml`
    /// when none was found
    pub path: PathBuf,
}

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `PatcherError::Config` if:
/// - The explicit file does not exist
/// - A file was found but its format is invalid
/// - An environment override has an invalid value
/// - The report date format has an unknown specifier
pub fn load(path: Option<PathBuf>) -> Result<LoadedConfig> {
    let support_dir =
        env_var_opt("PATCHER_SUPPORT_DIR").map_or_else(default_support_dir, PathBuf::from);

    let source = path.or_else(|| probe_config_paths(&support_dir));
    let mut config = match &source {
        Some(file) => load_from_file(file)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    if config.paths.support_dir.is_none() {
        config.paths.support_dir = Some(support_dir);
    }
    apply_env_overrides(&mut config)?;
    validate(&config)?;

    let path = source.unwrap_or_else(|| config.paths.config_path());
    Ok(LoadedConfig { config, path })
}

/// Reject values that would otherwise only fail mid-run.
///
/// # Errors
/// Returns `PatcherError::Config` for an unusable `report.date_format`.
pub fn validate(config: &Config) -> Result<()> {
    let format = &config.report.date_format;
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(PatcherError::config(format!("Invalid report date_format: {format}")));
    }
    Ok(())
}

/// Platform data directory joined with `Patcher`.
///
/// Falls back to the working directory when the platform exposes none.
#[must_use]
pub fn default_support_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR_NAME))
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PatcherError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(PatcherError::config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| PatcherError::config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Write configuration in the format named by the file extension, creating
/// parent directories. Anything but `.json` is written as TOML.
///
/// # Errors
/// Returns `PatcherError::Config` if serialization or the write fails.
pub fn save_to_file(config: &Config, path: &Path) -> Result<()> {
    let contents = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::to_string_pretty(config)
            .map_err(|e| PatcherError::config(format!("Failed to serialize config: {e}")))?,
        _ => toml::to_string_pretty(config)
            .map_err(|e| PatcherError::config(format!("Failed to serialize config: {e}")))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| PatcherError::config(format!("Failed to create config directory: {e}")))?;
    }

    std::fs::write(path, contents)
        .map_err(|e| PatcherError::config(format!("Failed to write config file: {e}")))?;

    tracing::info!(path = %path.display(), "Configuration saved");
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `PatcherError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PatcherError::config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PatcherError::config(format!("Invalid JSON format: {e}"))),
        _ => Err(PatcherError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths(support_dir: &Path) -> Option<PathBuf> {
    let mut candidates = vec![support_dir.join("config.toml"), support_dir.join("config.json")];

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([cwd.join("patcher.toml"), cwd.join("patcher.json")]);
    }

    candidates.into_iter().find(|path| path.is_file())
}

/// Apply `PATCHER_*` environment overrides
///
/// # Errors
/// Returns `PatcherError::Config` if a numeric override cannot be parsed.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(dir) = env_var_opt("PATCHER_SUPPORT_DIR") {
        config.paths.support_dir = Some(PathBuf::from(dir));
    }
    if let Some(timeout) = env_parse::<u64>("PATCHER_REQUEST_TIMEOUT")? {
        config.api.request_timeout_secs = timeout;
    }
    if let Some(limit) = env_parse::<usize>("PATCHER_MAX_CONCURRENCY")? {
        config.api.max_concurrency = limit;
    }
    if let Some(url) = env_var_opt("PATCHER_SOFA_FEED_URL") {
        config.api.sofa_feed_url = url;
    }
    Ok(())
}

/// Non-empty environment variable, if set
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_var_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| PatcherError::config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
