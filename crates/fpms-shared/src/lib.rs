//! # FPMS Shared
//!
//! Shared types, configuration, and telemetry for the family-registry
//! portal.

pub mod constants;
pub mod types;
pub mod telemetry;
pub mod config;

pub use types::*;
