//! Largest-Triangle-Three-Buckets (LTTB) downsampling.
//!
//! LTTB keeps the points that contribute most to the visual shape of a
//! series. The interior of the series is split into equally sized buckets
//! and from each bucket the point forming the largest triangle with the
//! previously kept point and the centroid of the following bucket is kept.
//!
//! The output holds **at most** `threshold` points. A bucket whose range is
//! empty, or whose candidates only produce NaN areas, is skipped rather than
//! padded.

use std::ops::Range;

use telemetry_core::Sample;

/// Downsample `points` to at most `threshold` points.
///
/// Series no longer than `threshold` are returned unchanged. Otherwise the
/// first and last points are always kept; a `threshold` below 3 keeps only
/// those two.
pub fn decimate(points: &[Sample], threshold: usize) -> Vec<Sample> {
    let len = points.len();
    if len <= threshold {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[len - 1];

    if threshold < 3 {
        return vec![first, last];
    }

    let n_buckets = threshold - 2;
    let bucket_size = (len - 2) as f64 / n_buckets as f64;

    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(first);

    // Index of the previously selected point
    let mut a = 0usize;
    let mut skipped = 0usize;

    for i in 0..n_buckets {
        let next = bucket_bounds(i + 1, bucket_size, len);
        let Some((avg_x, avg_y)) = centroid(&points[next]) else {
            skipped += 1;
            continue;
        };

        let range = bucket_bounds(i, bucket_size, len);
        if range.is_empty() {
            skipped += 1;
            continue;
        }

        let anchor = points[a];
        let mut max_area = -1.0;
        let mut selected = None;

        for j in range {
            let area = triangle_area(&anchor, &points[j], avg_x, avg_y);
            if area > max_area {
                max_area = area;
                selected = Some(j);
            }
        }

        match selected {
            Some(j) => {
                sampled.push(points[j]);
                a = j;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, threshold, "LTTB skipped buckets without a selectable point");
    }

    sampled.push(last);
    sampled
}

/// Index range of bucket `i`, offset by one to skip the retained first point
fn bucket_bounds(i: usize, bucket_size: f64, len: usize) -> Range<usize> {
    let start = (i as f64 * bucket_size).floor() as usize + 1;
    let end = ((i + 1) as f64 * bucket_size).floor() as usize + 1;
    start.min(len)..end.min(len)
}

/// Mean timestamp and mean value of a bucket
fn centroid(bucket: &[Sample]) -> Option<(f64, f64)> {
    if bucket.is_empty() {
        return None;
    }

    let n = bucket.len() as f64;
    let sum_x: f64 = bucket.iter().map(|p| p.timestamp.as_f64()).sum();
    let sum_y: f64 = bucket.iter().map(|p| p.value).sum();

    Some((sum_x / n, sum_y / n))
}

/// Area of the triangle (anchor, candidate, centroid)
fn triangle_area(anchor: &Sample, candidate: &Sample, cx: f64, cy: f64) -> f64 {
    let ax = anchor.timestamp.as_f64();
    let ay = anchor.value;
    let px = candidate.timestamp.as_f64();
    let py = candidate.value;

    ((ax - cx) * (py - ay) - (ax - px) * (cy - ay)).abs() * 0.5
}
