//! Moment statistics over sampled values.
//!
//! Quartiles are index lookups into the sorted sample
//! (`sorted[floor(n * 0.25)]`, `sorted[floor(n * 0.75)]`), not interpolated.
//! Standard deviation is the population form (N denominator).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Multiplier for the distribution fences in `DistributionStats`.
pub const FENCE_MULTIPLIER: f64 = 1.5;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Index-based quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let sorted = sorted_copy(values);
        Self::from_sorted(&sorted)
    }

    fn from_sorted(sorted: &[f64]) -> Self {
        let n = sorted.len();
        let at = |fraction: f64| sorted[((n as f64 * fraction).floor() as usize).min(n - 1)];
        Self {
            q1: at(0.25),
            median: at(0.5),
            q3: at(0.75),
        }
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// `[q1 - k * iqr, q3 + k * iqr]`
    pub fn fences(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }
}

/// Shape of a sampled distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis (0 for a normal distribution)
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Samples outside the 1.5 x IQR fences
    pub fence_outliers: usize,
}

impl DistributionStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let m = mean(values);
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - m;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let std_dev = m2.sqrt();
        let (skewness, kurtosis) = if m2 > f64::EPSILON {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        let sorted = sorted_copy(values);
        let quartiles = Quartiles::from_sorted(&sorted);
        let (lower_fence, upper_fence) = quartiles.fences(FENCE_MULTIPLIER);
        let fence_outliers = sorted
            .iter()
            .filter(|&&v| v < lower_fence || v > upper_fence)
            .count();

        Self {
            mean: m,
            std_dev,
            skewness,
            kurtosis,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q1: quartiles.q1,
            median: quartiles.median,
            q3: quartiles.q3,
            iqr: quartiles.iqr(),
            lower_fence,
            upper_fence,
            fence_outliers,
        }
    }
}
