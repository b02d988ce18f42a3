//! Descriptive statistics with IQR outlier detection.

use serde::{Deserialize, Serialize};

/// Tukey fence multiplier
const IQR_FENCE: f64 = 1.5;

/// Descriptive statistics of a value series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResult {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Population variance
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub p95: f64,
    pub p99: f64,
    pub outlier_count: usize,
    pub outlier_percentage: f64,
}

impl StatisticsResult {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Inclusive `(lower, upper)` bounds outside which values are outliers
    pub fn outlier_fence(&self) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - IQR_FENCE * iqr, self.q3 + IQR_FENCE * iqr)
    }
}

/// Compute statistics over `values`; `None` when the input is empty.
///
/// Quartiles and percentiles use nearest-rank selection on the sorted
/// copy (`sorted[floor(n * p)]`), without interpolation.
pub fn analyze(values: &[f64]) -> Option<StatisticsResult> {
    if values.is_empty() {
        return None;
    }

    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    let q1 = nearest_rank(&sorted, 0.25);
    let q3 = nearest_rank(&sorted, 0.75);
    let p95 = nearest_rank(&sorted, 0.95);
    let p99 = nearest_rank(&sorted, 0.99);

    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;
    let outlier_count = values.iter().filter(|&&v| v < lower || v > upper).count();

    Some(StatisticsResult {
        mean,
        median,
        std_dev,
        variance,
        min: sorted[0],
        max: sorted[n - 1],
        q1,
        q3,
        p95,
        p99,
        outlier_count,
        outlier_percentage: 100.0 * outlier_count as f64 / n as f64,
    })
}

fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let index = (sorted.len() as f64 * p).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert!(analyze(&[]).is_none());
    }

    #[test]
    fn test_outlier_example() {
        let stats = analyze(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();

        assert!((stats.mean - 19.1667).abs() < 1e-3);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 5.0);
        assert_eq!(stats.outlier_fence(), (-2.5, 9.5));
        assert_eq!(stats.outlier_count, 1);
        assert!((stats.outlier_percentage - 16.6667).abs() < 1e-3);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.p95, 100.0);
        assert_eq!(stats.p99, 100.0);
    }

    #[test]
    fn test_population_variance() {
        let stats = analyze(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();

        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.variance, 4.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.median, 4.5);
    }

    #[test]
    fn test_single_value() {
        let stats = analyze(&[7.25]).unwrap();

        assert_eq!(stats.median, 7.25);
        assert_eq!(stats.q1, 7.25);
        assert_eq!(stats.p99, 7.25);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_input_order_irrelevant() {
        let shuffled = analyze(&[100.0, 3.0, 1.0, 5.0, 2.0, 4.0]).unwrap();
        let ordered = analyze(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();

        assert_eq!(shuffled.median, ordered.median);
        assert_eq!(shuffled.q1, ordered.q1);
        assert_eq!(shuffled.outlier_count, ordered.outlier_count);
    }

    #[test]
    fn test_fence_values_are_not_outliers() {
        // q1 = 2, q3 = 4 → fence [-1, 7]; both -1 and 7 sit exactly on it
        let stats = analyze(&[-1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 7.0, 3.0]).unwrap();
        assert_eq!(stats.outlier_fence(), (-1.0, 7.0));
        assert_eq!(stats.outlier_count, 0);
    }

    #[test]
    fn test_wire_names() {
        let stats = analyze(&[1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&stats).unwrap();

        assert!(json.get("stdDev").is_some());
        assert!(json.get("outlierCount").is_some());
        assert!(json.get("outlierPercentage").is_some());
    }
}
