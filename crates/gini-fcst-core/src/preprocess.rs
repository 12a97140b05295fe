//! Series preprocessing: ordering and gap filling.
//!
//! Raw observations are sorted by period, interior gaps are filled by linear
//! interpolation weighted by period distance, and anything interpolation
//! cannot resolve (leading or trailing gaps) is dropped.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{ForecastError, Result};

/// A (period, value) pair; `None` marks a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub period: i32,
    pub value: Option<f64>,
}

impl Observation {
    /// Create an observation. Non-finite values are treated as missing.
    pub fn new(period: i32, value: Option<f64>) -> Self {
        Self {
            period,
            value: value.filter(|v| v.is_finite()),
        }
    }
}

/// Gap-free series ordered by ascending period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    periods: Vec<i32>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series from already clean data.
    ///
    /// Periods must be strictly ascending and every value finite.
    pub fn new(periods: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if periods.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Periods and values must have the same length: {} vs {}",
                periods.len(),
                values.len()
            )));
        }
        if periods.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidInput(
                "Periods must be strictly ascending".to_string(),
            ));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "Series contains non-finite value {}",
                v
            )));
        }
        Ok(Self { periods, values })
    }

    pub fn periods(&self) -> &[i32] {
        &self.periods
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last observed period.
    pub fn last_period(&self) -> Option<i32> {
        self.periods.last().copied()
    }

    /// The series as observations (all present).
    pub fn observations(&self) -> Vec<Observation> {
        self.periods
            .iter()
            .zip(&self.values)
            .map(|(&p, &v)| Observation::new(p, Some(v)))
            .collect()
    }
}

/// Observations removed by [`preprocess_with_counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    /// Missing values outside the interpolated range (leading or trailing gaps)
    pub unresolved: usize,
    /// Repeated periods after the first
    pub duplicates: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unresolved + self.duplicates
    }
}

/// Sort observations by ascending period (stable on ties).
pub fn sort_by_period(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.period);
    sorted
}

/// Fill interior gaps by linear interpolation over period distance.
///
/// `periods` must be sorted ascending. A missing value at period `p` between
/// known values `v0` at `p0` and `v1` at `p1` becomes
/// `v0 + (v1 - v0) * (p - p0) / (p1 - p0)`. Leading and trailing gaps stay
/// missing.
pub fn interpolate_by_period(periods: &[i32], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();

    let mut prev: Option<usize> = None;
    for i in 0..result.len() {
        let Some(v1) = result[i] else {
            continue;
        };
        if let Some(p) = prev {
            if i - p > 1 {
                let (p0, v0) = (periods[p] as f64, result[p].unwrap_or(v1));
                let span = periods[i] as f64 - p0;
                for j in (p + 1)..i {
                    result[j] = if span > 0.0 {
                        Some(v0 + (v1 - v0) * (periods[j] as f64 - p0) / span)
                    } else {
                        Some(v0)
                    };
                }
            }
        }
        prev = Some(i);
    }

    result
}

/// Sort, interpolate, and drop unresolved observations.
///
/// Never fails on an all-missing input: the result is simply empty.
pub fn preprocess(observations: &[Observation]) -> Series {
    preprocess_with_counts(observations).0
}

/// [`preprocess`], also reporting why observations were dropped.
pub fn preprocess_with_counts(observations: &[Observation]) -> (Series, DropCounts) {
    let sorted = sort_by_period(observations);
    let periods: Vec<i32> = sorted.iter().map(|o| o.period).collect();
    let values: Vec<Option<f64>> = sorted.iter().map(|o| o.value).collect();
    let filled = interpolate_by_period(&periods, &values);

    let n_missing = values.iter().filter(|v| v.is_none()).count();
    let mut out_periods = Vec::with_capacity(filled.len());
    let mut out_values = Vec::with_capacity(filled.len());
    let mut counts = DropCounts::default();
    for (period, value) in periods.into_iter().zip(filled) {
        let Some(v) = value else {
            counts.unresolved += 1;
            continue;
        };
        // Duplicate periods are an upstream data-quality issue; keep the first.
        if out_periods.last() == Some(&period) {
            tracing::warn!(period, "duplicate period dropped");
            counts.duplicates += 1;
            continue;
        }
        out_periods.push(period);
        out_values.push(v);
    }

    tracing::debug!(
        n_input = observations.len(),
        n_missing,
        n_interpolated = n_missing.saturating_sub(counts.unresolved),
        n_unresolved = counts.unresolved,
        n_duplicates = counts.duplicates,
        "series preprocessed"
    );

    let series = Series {
        periods: out_periods,
        values: out_values,
    };
    (series, counts)
}

/// Sort a dataset by year and interpolate every numeric indicator.
///
/// Leading and trailing gaps remain missing so row alignment is preserved.
pub fn interpolate_frame(dataset: &Dataset) -> Result<Dataset> {
    dataset
        .sorted_by_year()
        .map_numeric(|years, values| interpolate_by_period(years, values))
}
