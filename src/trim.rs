//! Boundary-exact trimming
//!
//! A trim over `[start, end]` keeps every original sample inside the window
//! and makes sure the result begins exactly at `start` and ends exactly at
//! `end`. Missing boundary samples are synthesized from the full original
//! series: linear interpolation between the two straddling samples, or the
//! first/last value when the boundary lies outside the recording.

use serde::Serialize;

/// Relative tolerance under which two timestamps are the same instant.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// A trimmed series. `timestamps` and `samples` always have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrimResult {
    pub timestamps: Vec<f64>,
    pub samples: Vec<f64>,
}

impl TrimResult {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn passthrough(timestamps: &[f64], samples: &[f64]) -> Self {
        Self {
            timestamps: timestamps.to_vec(),
            samples: samples.to_vec(),
        }
    }
}

/// True when `a` and `b` are numerically indistinguishable.
pub fn same_instant(a: f64, b: f64) -> bool {
    (a - b).abs() <= BOUNDARY_TOLERANCE * 1f64.max(a.abs()).max(b.abs())
}

/// Trim a series to `[start, end]`.
///
/// `timestamps` must be ascending and the same length as `samples`; the
/// caller guarantees `end > start`. Non-finite bounds return the series
/// untouched, as does an empty series (there is nothing to clamp to).
pub fn trim(timestamps: &[f64], samples: &[f64], start: f64, end: f64) -> TrimResult {
    let len = timestamps.len().min(samples.len());
    let (timestamps, samples) = (&timestamps[..len], &samples[..len]);

    if !start.is_finite() || !end.is_finite() || len == 0 {
        return TrimResult::passthrough(timestamps, samples);
    }

    let mut result = TrimResult::default();

    let first_inside = timestamps
        .iter()
        .find(|&&t| t >= start && t <= end)
        .copied();
    if first_inside.is_none_or(|t| !same_instant(t, start)) {
        result.timestamps.push(start);
        result.samples.push(boundary_value(timestamps, samples, start));
    }

    for (&t, &v) in timestamps.iter().zip(samples) {
        if t >= start && t <= end {
            result.timestamps.push(t);
            result.samples.push(v);
        }
    }

    let ends_at_end = result.timestamps.last().is_some_and(|&t| same_instant(t, end));
    if !ends_at_end || result.len() < 2 {
        result.timestamps.push(end);
        result.samples.push(boundary_value(timestamps, samples, end));
    }

    result
}

/// Trim with textual bounds. Bounds that do not parse as numbers leave the
/// series untouched; this is a pass-through, not an error.
pub fn trim_bounds(timestamps: &[f64], samples: &[f64], start: &str, end: &str) -> TrimResult {
    match (start.trim().parse::<f64>(), end.trim().parse::<f64>()) {
        (Ok(start), Ok(end)) => trim(timestamps, samples, start, end),
        _ => TrimResult::passthrough(timestamps, samples),
    }
}

/// Value of the series at `bound`, computed against the full original
/// series. Clamps outside the recorded range.
fn boundary_value(timestamps: &[f64], samples: &[f64], bound: f64) -> f64 {
    let idx = timestamps.partition_point(|&t| t < bound);
    if idx == 0 {
        return samples[0];
    }
    if idx == timestamps.len() {
        return samples[samples.len() - 1];
    }

    let (t0, t1) = (timestamps[idx - 1], timestamps[idx]);
    let (v0, v1) = (samples[idx - 1], samples[idx]);
    if t1 == t0 {
        return v0;
    }
    v0 + (v1 - v0) * (bound - t0) / (t1 - t0)
}
