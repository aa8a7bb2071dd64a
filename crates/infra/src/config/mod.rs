//! Configuration loading and management
//!
//! This module provides utilities for loading application configuration
//! from files and environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    apply_env_overrides, default_support_dir, load, load_from_file, probe_config_paths,
    save_to_file, validate, LoadedConfig,
};
