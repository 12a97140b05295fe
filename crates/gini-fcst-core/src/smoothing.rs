//! Brown's double exponential smoothing.
//!
//! Single-parameter form of Holt's linear method:
//!
//! ```text
//! S'_t  = α Y_t + (1 - α) S'_{t-1}
//! S''_t = α S'_t + (1 - α) S''_{t-1}
//! a_t   = 2 S'_t - S''_t
//! b_t   = α / (1 - α) (S'_t - S''_t)
//! F_t   = a_{t-1} + b_{t-1}
//! ```
//!
//! Both smoothed series are seeded with the first observation, so period 0
//! is a warm-up point and carries no forecast.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::preprocess::Series;

/// Smoothing factor in the open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Alpha(f64);

impl Alpha {
    /// Default used by the dashboard controls.
    pub const DEFAULT: f64 = 0.60;

    /// Validate a smoothing factor.
    ///
    /// α = 1 is rejected: the trend term divides by (1 - α).
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(ForecastError::invalid_parameter(
                "alpha",
                value,
                "must be strictly between 0 and 1",
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for Alpha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Alpha {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ForecastError::invalid_parameter("alpha", s, "not a number"))?;
        Self::new(value)
    }
}

/// One row of the smoothing table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothingRow {
    pub period: i32,
    pub actual: f64,
    pub s1: f64,
    pub s2: f64,
    pub level: f64,
    pub trend: f64,
    /// One-step-ahead forecast; `None` for the warm-up period.
    pub forecast: Option<f64>,
}

/// Per-period smoothing state for a whole series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothingState {
    pub alpha: Alpha,
    pub periods: Vec<i32>,
    pub actual: Vec<f64>,
    /// Single-smoothed series S'
    pub s1: Vec<f64>,
    /// Double-smoothed series S''
    pub s2: Vec<f64>,
    /// Level a_t
    pub level: Vec<f64>,
    /// Trend b_t
    pub trend: Vec<f64>,
    /// In-sample one-step-ahead forecasts
    pub forecast: Vec<Option<f64>>,
}

impl SmoothingState {
    /// Number of periods.
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    /// Level at the last observed period.
    pub fn final_level(&self) -> f64 {
        self.level.last().copied().unwrap_or(f64::NAN)
    }

    /// Trend at the last observed period.
    pub fn final_trend(&self) -> f64 {
        self.trend.last().copied().unwrap_or(f64::NAN)
    }

    /// Last observed period.
    pub fn last_period(&self) -> Option<i32> {
        self.periods.last().copied()
    }

    /// The state as table rows.
    pub fn rows(&self) -> Vec<SmoothingRow> {
        (0..self.len())
            .map(|t| SmoothingRow {
                period: self.periods[t],
                actual: self.actual[t],
                s1: self.s1[t],
                s2: self.s2[t],
                level: self.level[t],
                trend: self.trend[t],
                forecast: self.forecast[t],
            })
            .collect()
    }

    /// Paired (actual, forecast) values for every period with a forecast.
    pub fn forecast_pairs(&self) -> (Vec<i32>, Vec<f64>, Vec<f64>) {
        let mut periods = Vec::with_capacity(self.len().saturating_sub(1));
        let mut actual = Vec::with_capacity(self.len().saturating_sub(1));
        let mut forecast = Vec::with_capacity(self.len().saturating_sub(1));
        for t in 0..self.len() {
            if let Some(f) = self.forecast[t] {
                periods.push(self.periods[t]);
                actual.push(self.actual[t]);
                forecast.push(f);
            }
        }
        (periods, actual, forecast)
    }
}

/// Brown's double exponential smoothing model.
#[derive(Debug, Clone, Copy)]
pub struct DoubleExponentialSmoothing {
    alpha: Alpha,
}

impl DoubleExponentialSmoothing {
    /// Minimum number of observations: one to seed, one to update.
    pub const MIN_OBSERVATIONS: usize = 2;

    pub fn new(alpha: Alpha) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> Alpha {
        self.alpha
    }

    /// Run the recurrence over a gap-free series.
    ///
    /// Pure function of (series, α): repeated calls yield identical output.
    pub fn fit(&self, series: &Series) -> Result<SmoothingState> {
        let y = series.values();
        let n = y.len();
        if n < Self::MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                needed: Self::MIN_OBSERVATIONS,
                got: n,
            });
        }

        let alpha = self.alpha.get();
        let mut s1 = Vec::with_capacity(n);
        let mut s2 = Vec::with_capacity(n);
        s1.push(y[0]);
        s2.push(y[0]);
        for t in 1..n {
            let next_s1 = alpha * y[t] + (1.0 - alpha) * s1[t - 1];
            let next_s2 = alpha * next_s1 + (1.0 - alpha) * s2[t - 1];
            s1.push(next_s1);
            s2.push(next_s2);
        }

        let trend_factor = alpha / (1.0 - alpha);
        let level: Vec<f64> = s1.iter().zip(&s2).map(|(a, b)| 2.0 * a - b).collect();
        let trend: Vec<f64> = s1
            .iter()
            .zip(&s2)
            .map(|(a, b)| trend_factor * (a - b))
            .collect();

        let mut forecast = Vec::with_capacity(n);
        forecast.push(None);
        for t in 1..n {
            forecast.push(Some(level[t - 1] + trend[t - 1]));
        }

        tracing::debug!(n, alpha, "double exponential smoothing fitted");

        Ok(SmoothingState {
            alpha: self.alpha,
            periods: series.periods().to_vec(),
            actual: y.to_vec(),
            s1,
            s2,
            level,
            trend,
            forecast,
        })
    }
}
