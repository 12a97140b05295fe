//! Descriptive statistics for indicator columns.

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::dataset::Dataset;
use crate::error::Result;

/// Summary statistics of a numeric column (missing values excluded).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    /// Number of non-missing values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    /// Minimum value
    pub min: f64,
    /// First quartile (25th percentile)
    pub q25: f64,
    /// Median (50th percentile)
    pub median: f64,
    /// Third quartile (75th percentile)
    pub q75: f64,
    /// Maximum value
    pub max: f64,
}

impl Default for Describe {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Compute summary statistics for a column with potential missing values.
///
/// Quantiles use linear interpolation between order statistics. An empty
/// column yields `count = 0` and NaN everywhere else; a single value has a
/// NaN standard deviation.
pub fn describe(values: &[Option<f64>]) -> Describe {
    let mut sorted: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();
    if sorted.is_empty() {
        return Describe::default();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let std = if sorted.len() > 1 {
        sorted.iter().std_dev()
    } else {
        f64::NAN
    };

    Describe {
        count: sorted.len(),
        mean: sorted.iter().mean(),
        std,
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q75: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

/// Describe every numeric column of a dataset, in column order.
pub fn describe_dataset(dataset: &Dataset) -> Result<Vec<(String, Describe)>> {
    dataset
        .numeric_columns()
        .into_iter()
        .map(|name| Ok((name.to_string(), describe(dataset.numeric(name)?))))
        .collect()
}

/// Calculate a percentile from sorted values by linear interpolation.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let n = sorted.len() as f64;
    let idx = p * (n - 1.0);
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
