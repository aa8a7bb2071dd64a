//! Device OS compliance against a release catalog

pub mod reconciler;

pub use reconciler::reconcile;
