//! Reducers over trial populations. Every reducer is total: empty or
//! degenerate input yields a defined sentinel instead of a panic.

use serde::{Deserialize, Serialize};

/// Replace NaN and ±Inf with 0.0.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator); 0.0 below two observations.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Percentile (0-100) of a **sorted** slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let frac = rank - lower as f64;
                sorted[lower] * (1.0 - frac) + sorted[upper] * frac
            }
        }
    }
}

pub fn median(values: &[f64]) -> f64 {
    percentile_sorted(&sorted(values), 50.0)
}

/// Element-wise mean of equal-length series. Shorter series contribute only
/// to the positions they cover.
pub fn mean_series(series: &[Vec<f64>]) -> Vec<f64> {
    let len = series.iter().map(Vec::len).max().unwrap_or(0);
    (0..len)
        .map(|i| {
            let column: Vec<f64> = series.iter().filter_map(|s| s.get(i).copied()).collect();
            sanitize(mean(&column))
        })
        .collect()
}

/// Summary of one metric across trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    pub fn from_samples(values: &[f64]) -> Self {
        if values.is_empty() {
            return SummaryStats::default();
        }
        let sorted = sorted(values);
        SummaryStats {
            mean: sanitize(mean(values)),
            median: sanitize(percentile_sorted(&sorted, 50.0)),
            min: sanitize(sorted[0]),
            max: sanitize(sorted[sorted.len() - 1]),
        }
    }
}

/// Metrics reported by mean only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanStat {
    pub mean: f64,
}

impl MeanStat {
    pub fn from_samples(values: &[f64]) -> Self {
        let cleaned: Vec<f64> = values.iter().copied().map(sanitize).collect();
        MeanStat {
            mean: sanitize(mean(&cleaned)),
        }
    }
}
