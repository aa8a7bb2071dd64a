//! Report artifact writers

pub mod json;

pub use json::JsonReportExporter;
