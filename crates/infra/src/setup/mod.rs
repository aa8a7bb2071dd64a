//! First-run setup, credential reset and the completion marker

pub mod marker;
pub mod orchestrator;

pub use marker::PlistMarker;
pub use orchestrator::{
    normalize_server_url, SetupOptions, SetupOrchestrator, SetupOutcome, SetupState,
};
