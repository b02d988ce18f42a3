//! Frequency analysis of telemetry values.
//!
//! The spectrum is computed with a direct discrete Fourier transform
//! (O(N²)), so results are exact to the DFT definition for any length,
//! not only powers of two. Only the non-negative half of the spectrum is
//! returned, which is all a real-valued signal needs.
//!
//! `spectrum` never windows its input. Callers that care about spectral
//! leakage apply a window first with [`apply_window`].

use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Magnitude spectrum over bins `[0, N/2)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Bin indices
    pub frequencies: Vec<usize>,
    /// Magnitude per bin, normalized by N
    pub magnitudes: Vec<f64>,
}

impl SpectrumResult {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Window applied to values before the transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    #[default]
    None,
    Hann,
}

/// Direct DFT magnitude spectrum of a real-valued signal
pub fn spectrum(values: &[f64]) -> SpectrumResult {
    let n = values.len();
    let half = n / 2;

    let mut frequencies = Vec::with_capacity(half);
    let mut magnitudes = Vec::with_capacity(half);

    for k in 0..half {
        let mut acc = Complex::new(0.0, 0.0);
        for (i, &v) in values.iter().enumerate() {
            let angle = -2.0 * PI * k as f64 * i as f64 / n as f64;
            acc += Complex::new(v * angle.cos(), v * angle.sin());
        }

        frequencies.push(k);
        magnitudes.push((acc.re * acc.re + acc.im * acc.im).sqrt() / n as f64);
    }

    SpectrumResult {
        frequencies,
        magnitudes,
    }
}

/// Hann window coefficients
pub fn hann_window(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }

    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Multiply values by the selected window
pub fn apply_window(values: &[f64], window: WindowFunction) -> Vec<f64> {
    match window {
        WindowFunction::None => values.to_vec(),
        WindowFunction::Hann => values
            .iter()
            .zip(hann_window(values.len()))
            .map(|(v, w)| v * w)
            .collect(),
    }
}
