//! Population statistics over feature sequences.

use crate::analysis::{Measured, Reason};

pub fn mean(values: &[f64]) -> Measured<f64> {
    if values.is_empty() {
        return Err(Reason::EmptySeries);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> Measured<f64> {
    let mean = mean(values)?;
    Ok(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn std_dev(values: &[f64]) -> Measured<f64> {
    variance(values).map(f64::sqrt)
}

/// `std / mean`; fails on a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Measured<f64> {
    let mean = mean(values)?;
    if mean == 0.0 {
        return Err(Reason::SilentSignal);
    }
    Ok(std_dev(values)? / mean)
}

pub fn count_above(values: &[f64], threshold: f64) -> usize {
    values.iter().filter(|&&v| v > threshold).count()
}

/// First differences `x[i + 1] - x[i]`.
pub fn deltas(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Parameters of onset-style peak picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPicking {
    /// Frames on each side that `x[n]` must dominate.
    pub max_window: usize,
    /// Frames on each side of the local average.
    pub avg_window: usize,
    /// Margin over the local average.
    pub delta: f64,
    /// Frames that must pass after an accepted peak.
    pub wait: usize,
}

impl Default for PeakPicking {
    fn default() -> Self {
        Self {
            max_window: 3,
            avg_window: 3,
            delta: 0.1,
            wait: 10,
        }
    }
}

impl PeakPicking {
    /// Indices of accepted peaks in ascending order.
    pub fn pick(&self, values: &[f64]) -> Vec<usize> {
        let mut peaks = Vec::new();
        let mut last: Option<usize> = None;
        for (n, &value) in values.iter().enumerate() {
            if let Some(previous) = last {
                if n - previous <= self.wait {
                    continue;
                }
            }
            let local = window(values, n, self.max_window);
            if local.iter().any(|&other| other > value) {
                continue;
            }
            let around = window(values, n, self.avg_window);
            let local_mean = around.iter().sum::<f64>() / around.len() as f64;
            if value >= local_mean + self.delta {
                peaks.push(n);
                last = Some(n);
            }
        }
        peaks
    }
}

fn window(values: &[f64], center: usize, radius: usize) -> &[f64] {
    let start = center.saturating_sub(radius);
    let end = (center + radius + 1).min(values.len());
    &values[start..end]
}
