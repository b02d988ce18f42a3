//! Fundamental types for telemetry samples.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Caller-defined monotonic timestamp (unit chosen by the feed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Timestamp as a coordinate for geometric computations
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A single telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp: Timestamp(timestamp),
            value,
        }
    }
}

/// Extract the value column of a sequence
pub fn values_of(points: &[Sample]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

/// Build a new sequence with the timestamps of `points` and the given values.
///
/// `values` must have the same length as `points`; extra entries on either
/// side are dropped.
pub fn with_values(points: &[Sample], values: &[f64]) -> Vec<Sample> {
    points
        .iter()
        .zip(values)
        .map(|(p, &value)| Sample {
            timestamp: p.timestamp,
            value,
        })
        .collect()
}

/// Identifier for caller-owned filter handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(pub Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
