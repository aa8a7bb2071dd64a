//! Plist-backed completion marker
//!
//! Setup records `{"first_run_done": true}` once every step succeeded. A
//! missing file means setup never ran. Unrelated keys already present in the
//! file are preserved on write.

use std::path::{Path, PathBuf};

use patcher_core::CompletionMarker;
use patcher_domain::{PatcherError, Result};
use plist::{Dictionary, Value};
use tracing::debug;

const FIRST_RUN_KEY: &str = "first_run_done";

/// Completion marker stored as an XML property list
#[derive(Debug, Clone)]
pub struct PlistMarker {
    path: PathBuf,
}

impl PlistMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn plist_error(&self) -> PatcherError {
        PatcherError::Plist { path: Some(self.path.display().to_string()) }
    }

    fn read_dictionary(&self) -> Result<Option<Dictionary>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let value = Value::from_file(&self.path).map_err(|e| {
            debug!(path = %self.path.display(), error = %e, "Failed to read plist");
            self.plist_error()
        })?;

        value.into_dictionary().map(Some).ok_or_else(|| self.plist_error())
    }
}

impl CompletionMarker for PlistMarker {
    fn is_complete(&self) -> Result<bool> {
        let done = self
            .read_dictionary()?
            .and_then(|dict| dict.get(FIRST_RUN_KEY).and_then(Value::as_boolean))
            .unwrap_or(false);

        debug!(path = %self.path.display(), done, "Read completion marker");
        Ok(done)
    }

    fn set_complete(&self, complete: bool) -> Result<()> {
        let mut dict = self.read_dictionary()?.unwrap_or_default();
        dict.insert(FIRST_RUN_KEY.to_string(), Value::Boolean(complete));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| self.plist_error())?;
        }

        Value::Dictionary(dict).to_file_xml(&self.path).map_err(|e| {
            debug!(path = %self.path.display(), error = %e, "Failed to write plist");
            self.plist_error()
        })?;

        debug!(path = %self.path.display(), complete, "Wrote completion marker");
        Ok(())
    }
}
