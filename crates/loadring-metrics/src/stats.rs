//! Summary statistics over integer samples.

use serde::{Deserialize, Serialize};

/// Aggregate statistics over a slice of counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntStats {
    pub count: usize,
    pub sum: usize,
    pub mean: f64,
    pub max: usize,
    /// Population standard deviation.
    pub std: f64,
    /// Coefficient of variation, `std / mean`. 0 when the mean is 0.
    pub cv: f64,
}

/// Compute [`IntStats`] over `xs`. Empty input gives all-zero stats.
pub fn compute_int_stats(xs: &[usize]) -> IntStats {
    if xs.is_empty() {
        return IntStats::default();
    }

    let count = xs.len();
    let sum: usize = xs.iter().sum();
    let max = xs.iter().copied().max().unwrap_or(0);
    let mean = sum as f64 / count as f64;

    let variance = xs
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / count as f64;
    let std = variance.sqrt();
    let cv = if mean == 0.0 { 0.0 } else { std / mean };

    IntStats {
        count,
        sum,
        mean,
        max,
        std,
        cv,
    }
}
