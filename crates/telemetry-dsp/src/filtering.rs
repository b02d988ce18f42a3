//! Noise filters for telemetry values.
//!
//! Two filters are provided:
//!
//! - A centered moving average whose window shrinks at the series edges
//! - A scalar Kalman filter with a static process model
//!
//! Filters never keep state between requests on their own. Callers that
//! stream a series in chunks carry the state in a [`FilterHandle`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use telemetry_core::HandleId;

/// Default process noise variance (Q)
pub const DEFAULT_PROCESS_NOISE: f64 = 0.1;

/// Default measurement noise variance (R)
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 1.0;

/// Default moving average window
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Initial Kalman estimate covariance
const INITIAL_COVARIANCE: f64 = 1.0;

/// Filter selector used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    MovingAverage,
    Kalman,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::MovingAverage => write!(f, "movingAverage"),
            FilterKind::Kalman => write!(f, "kalman"),
        }
    }
}

/// Centered moving average.
///
/// Index `i` averages `values[i - w/2 ..= i + w/2]` clipped to the series;
/// the denominator is the number of samples actually included.
pub fn moving_average(values: &[f64], window_size: usize) -> Vec<f64> {
    let half = window_size / 2;
    (0..values.len())
        .map(|i| window_mean(values, i, half))
        .collect()
}

fn window_mean(values: &[f64], i: usize, half: usize) -> f64 {
    let start = i.saturating_sub(half);
    let end = (i + half + 1).min(values.len());
    let window = &values[start..end];
    window.iter().sum::<f64>() / window.len() as f64
}

/// Moving average that carries left context across chunks
pub struct MovingAverageFilter {
    window_size: usize,
    history: VecDeque<f64>,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            history: VecDeque::with_capacity(window_size / 2),
        }
    }

    /// Restore a filter from a previous chunk's trailing samples
    pub fn with_history(window_size: usize, history: &[f64]) -> Self {
        let half = window_size / 2;
        let keep = history.len().saturating_sub(half);
        Self {
            window_size,
            history: history[keep..].iter().copied().collect(),
        }
    }

    /// Filter the next chunk of a series.
    ///
    /// Samples retained from earlier chunks widen the left side of the
    /// window; the right side still shrinks at the end of the chunk.
    pub fn filter_chunk(&mut self, chunk: &[f64]) -> Vec<f64> {
        let half = self.window_size / 2;
        let offset = self.history.len();

        let mut context: Vec<f64> = Vec::with_capacity(offset + chunk.len());
        context.extend(self.history.iter().copied());
        context.extend_from_slice(chunk);

        let filtered = (offset..context.len())
            .map(|i| window_mean(&context, i, half))
            .collect();

        let keep = context.len().saturating_sub(half);
        self.history = context[keep..].iter().copied().collect();

        filtered
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn history(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Serializable state of a scalar Kalman filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KalmanState {
    pub estimate: f64,
    pub error_covariance: f64,
    pub process_noise: f64,
    pub measurement_noise: f64,
}

/// Kalman filter for 1D state estimation
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    /// State estimate
    x: f64,
    /// Estimate covariance
    p: f64,
    /// Process noise covariance
    q: f64,
    /// Measurement noise covariance
    r: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NOISE, DEFAULT_MEASUREMENT_NOISE)
    }
}

impl KalmanFilter {
    /// Create a filter with estimate 0 and covariance 1
    ///
    /// # Arguments
    /// * `process_noise` - Process noise variance (Q)
    /// * `measurement_noise` - Measurement noise variance (R)
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            x: 0.0,
            p: INITIAL_COVARIANCE,
            q: process_noise,
            r: measurement_noise,
        }
    }

    pub fn from_state(state: KalmanState) -> Self {
        Self {
            x: state.estimate,
            p: state.error_covariance,
            q: state.process_noise,
            r: state.measurement_noise,
        }
    }

    /// Update filter with new measurement
    pub fn filter(&mut self, measurement: f64) -> f64 {
        // Static model: prediction keeps the estimate
        let x_pred = self.x;
        let p_pred = self.p + self.q;

        let k = p_pred / (p_pred + self.r);
        self.x = x_pred + k * (measurement - x_pred);
        self.p = (1.0 - k) * p_pred;

        self.x
    }

    /// Feed a signal in order, continuing from the current state
    pub fn filter_signal(&mut self, signal: &[f64]) -> Vec<f64> {
        signal.iter().map(|&z| self.filter(z)).collect()
    }

    /// Restore estimate 0 and covariance 1; noise parameters are kept
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.p = INITIAL_COVARIANCE;
    }

    pub fn state(&self) -> KalmanState {
        KalmanState {
            estimate: self.x,
            error_covariance: self.p,
            process_noise: self.q,
            measurement_noise: self.r,
        }
    }

    pub fn estimate(&self) -> f64 {
        self.x
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }
}

/// Filter state carried by a handle between requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterCarry {
    Kalman(KalmanState),
    #[serde(rename_all = "camelCase")]
    MovingAverage {
        window_size: usize,
        history: Vec<f64>,
    },
}

/// Caller-owned filter state.
///
/// The host creates a handle once, sends it with each chunk of a series and
/// keeps the advanced handle returned with the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterHandle {
    pub id: HandleId,
    pub carry: FilterCarry,
}

impl FilterHandle {
    pub fn kalman(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            id: HandleId::new(),
            carry: FilterCarry::Kalman(KalmanFilter::new(process_noise, measurement_noise).state()),
        }
    }

    pub fn moving_average(window_size: usize) -> Self {
        Self {
            id: HandleId::new(),
            carry: FilterCarry::MovingAverage {
                window_size,
                history: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self.carry {
            FilterCarry::Kalman(_) => FilterKind::Kalman,
            FilterCarry::MovingAverage { .. } => FilterKind::MovingAverage,
        }
    }

    /// Filter the next chunk and advance the carried state
    pub fn apply(&mut self, values: &[f64]) -> Vec<f64> {
        match &mut self.carry {
            FilterCarry::Kalman(state) => {
                let mut kalman = KalmanFilter::from_state(*state);
                let filtered = kalman.filter_signal(values);
                *state = kalman.state();
                filtered
            }
            FilterCarry::MovingAverage {
                window_size,
                history,
            } => {
                let mut filter = MovingAverageFilter::with_history(*window_size, history);
                let filtered = filter.filter_chunk(values);
                *history = filter.history();
                filtered
            }
        }
    }
}
