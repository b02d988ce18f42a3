//! # Telemetry-DSP
//!
//! Numeric components of the telemetry stream-processing unit.
//!
//! Every function here operates on data supplied by the caller and returns
//! new values; nothing is cached between calls.
//!
//! ## Components
//!
//! 1. **Statistics**: descriptive statistics with IQR outlier detection
//! 2. **Spectrum**: direct DFT magnitude spectrum
//! 3. **Filtering**: centered moving average and scalar Kalman filter
//! 4. **Decimation**: Largest-Triangle-Three-Buckets downsampling

pub mod decimation;
pub mod filtering;
pub mod spectrum;
pub mod statistics;

pub use decimation::*;
pub use filtering::*;
pub use spectrum::*;
pub use statistics::*;
