//! Percentile extraction for Monte Carlo aggregation
//!
//! Values are sorted with `total_cmp` before any percentile is read, so the
//! result only depends on the multiset of trial values and never on the order
//! trials finished in.

/// Standard percentiles reported for every simulated year
pub mod standard {
    pub const P10: f64 = 0.10;
    pub const P25: f64 = 0.25;
    pub const P50: f64 = 0.50;
    pub const P75: f64 = 0.75;
    pub const P90: f64 = 0.90;
}

/// Sort in place with a total order (NaN sorts last)
pub fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Linearly interpolated percentile of an already sorted slice.
///
/// `p` is a fraction in [0, 1]. Returns 0.0 for an empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n as f64 - 1.0);
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let (lo, hi) = (sorted[lower], sorted[upper]);
                let w = rank - lower as f64;
                // Stay inside [lo, hi] so bands never cross under rounding
                (lo + (hi - lo) * w).max(lo).min(hi)
            }
        }
    }
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
