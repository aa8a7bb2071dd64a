//! Report pipeline: fetch, validate, sort, omit, augment and export

pub mod ports;
pub mod service;
pub mod transform;

pub use service::{ReportRequest, ReportService};
