//! Port interfaces for interactive setup
//!
//! The setup flow asks the user questions and records whether it has
//! completed; both concerns are injected so the flow can run against
//! scripted answers and temporary files.

use patcher_domain::Result;

/// Interactive questions asked during setup
pub trait Prompter: Send + Sync {
    /// Yes/no question; an empty answer picks `default`
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Free-text answer; an empty answer picks `default` when given
    fn input(&self, message: &str, default: Option<&str>) -> Result<String>;

    /// Answer that must not be echoed or logged
    fn secret(&self, message: &str) -> Result<String>;
}

/// Persistent record of whether first-run setup finished
pub trait CompletionMarker: Send + Sync {
    /// `false` when the marker is missing
    fn is_complete(&self) -> Result<bool>;

    /// Record the completion state
    fn set_complete(&self, complete: bool) -> Result<()>;
}
