//! Ports used by the first-run setup flow

pub mod ports;
