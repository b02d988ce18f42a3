//! # Telemetry-Core
//!
//! Core types and errors shared by the telemetry stream-processing unit.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
