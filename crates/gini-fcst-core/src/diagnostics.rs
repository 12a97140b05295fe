//! Stationarity, decomposition and autocorrelation diagnostics.
//!
//! These wrap anofox-forecast (ADF test, ACF/PACF) and fdars-core
//! (additive decomposition). None of them feed the forecast; each panel is
//! computed independently and a failure is reported as a warning instead of
//! failing the page.

use std::panic::{catch_unwind, AssertUnwindSafe};

use anofox_forecast::features::{autocorrelation, partial_autocorrelation};
use anofox_forecast::validation::adf_test;
use fdars_core::detrend::{
    decompose_additive as fdars_decompose_additive, DecomposeResult as FdarsDecomposeResult,
};
use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::preprocess::Series;

/// Significance level for the stationarity verdict.
pub const SIGNIFICANCE: f64 = 0.05;

/// Upper bound on correlogram lags.
pub const MAX_CORRELOGRAM_LAG: usize = 20;

/// Result of a diagnostic panel: either the value or a warning message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    Warning(String),
}

impl<T> Panel<T> {
    /// Capture a computation result, logging failures.
    pub fn capture(name: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Panel::Ready(value),
            Err(e) => {
                tracing::warn!(panel = name, error = %e, "diagnostic panel failed");
                Panel::Warning(format!("{} unavailable: {}", name, e))
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            Panel::Warning(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Panel::Ready(_) => None,
            Panel::Warning(msg) => Some(msg),
        }
    }
}

/// ADF critical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Augmented Dickey-Fuller test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdfReport {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    pub critical_values: CriticalValues,
    /// p-value below [`SIGNIFICANCE`]
    pub is_stationary: bool,
}

/// Run the ADF unit-root test with automatic lag selection.
pub fn stationarity(values: &[f64]) -> Result<AdfReport> {
    let result = adf_test(values, None);
    if !result.statistic.is_finite() || !result.p_value.is_finite() {
        return Err(ForecastError::ComputationError(format!(
            "ADF test is undefined for {} observations",
            values.len()
        )));
    }
    Ok(AdfReport {
        statistic: result.statistic,
        p_value: result.p_value,
        lags: result.lags,
        critical_values: CriticalValues {
            one_pct: result.critical_values.cv_1pct,
            five_pct: result.critical_values.cv_5pct,
            ten_pct: result.critical_values.cv_10pct,
        },
        is_stationary: result.p_value < SIGNIFICANCE,
    })
}

/// Apply `order` rounds of first differencing.
///
/// Each round shortens the series by one; differencing a series with at
/// most `order` values gives an empty result.
pub fn difference(values: &[f64], order: usize) -> Vec<f64> {
    let mut current = values.to_vec();
    for _ in 0..order {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Result of additive decomposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    /// Trend component
    pub trend: Vec<f64>,
    /// Seasonal component
    pub seasonal: Vec<f64>,
    /// Remainder/residual component
    pub remainder: Vec<f64>,
    /// Period used for decomposition
    pub period: f64,
}

impl From<FdarsDecomposeResult> for Decomposition {
    fn from(r: FdarsDecomposeResult) -> Self {
        Self {
            trend: r.trend,
            seasonal: r.seasonal,
            remainder: r.remainder,
            period: r.period,
        }
    }
}

/// Additive decomposition: data = trend + seasonal + remainder.
///
/// Annual data has no seasonality, so the dashboard uses `period = 1`.
pub fn decompose(values: &[f64], period: f64) -> Result<Decomposition> {
    if !period.is_finite() || period <= 0.0 {
        return Err(ForecastError::invalid_parameter(
            "period",
            period,
            "must be positive",
        ));
    }
    let n = values.len();
    let needed = (2.0 * period).ceil().max(2.0) as usize;
    if n < needed {
        return Err(ForecastError::InsufficientData { needed, got: n });
    }

    let argvals: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let harmonics = if period <= 1.0 { 1 } else { 3 };
    let result = catch_unwind(AssertUnwindSafe(|| {
        fdars_decompose_additive(values, n, 1, &argvals, period, "loess", 0.3, harmonics)
    }))
    .map_err(|_| ForecastError::ComputationError("decomposition panicked".to_string()))?;

    let decomposition = Decomposition::from(result);
    let finite = |v: &[f64]| v.len() == n && v.iter().all(|x| x.is_finite());
    if !finite(&decomposition.trend) || !finite(&decomposition.remainder) {
        return Err(ForecastError::ComputationError(
            "decomposition produced non-finite components".to_string(),
        ));
    }
    Ok(decomposition)
}

/// Autocorrelation and partial autocorrelation by lag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlogram {
    pub lags: Vec<usize>,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
}

/// Default number of lags for a series of length `n`: `min(20, n - 1)`.
pub fn default_max_lag(n: usize) -> usize {
    MAX_CORRELOGRAM_LAG.min(n.saturating_sub(1))
}

/// ACF and PACF for lags 1..=max_lag, capped at `n - 1`.
///
/// Lags the estimator cannot resolve are reported as NaN.
pub fn correlogram(values: &[f64], max_lag: usize) -> Result<Correlogram> {
    if values.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: values.len(),
        });
    }
    let max_lag = max_lag.min(values.len() - 1);
    if max_lag == 0 {
        return Err(ForecastError::invalid_parameter("max_lag", 0, "must be >= 1"));
    }

    let lags: Vec<usize> = (1..=max_lag).collect();
    let acf = lags.iter().map(|&k| autocorrelation(values, k)).collect();
    let pacf = lags
        .iter()
        .map(|&k| partial_autocorrelation(values, k))
        .collect();
    Ok(Correlogram { lags, acf, pacf })
}

/// All diagnostic panels for a prepared series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesDiagnostics {
    pub adf_level: Panel<AdfReport>,
    pub adf_first_difference: Panel<AdfReport>,
    pub adf_second_difference: Panel<AdfReport>,
    pub decomposition: Panel<Decomposition>,
    /// ACF/PACF of the second difference
    pub correlogram: Panel<Correlogram>,
}

impl TimeSeriesDiagnostics {
    pub fn compute(series: &Series) -> Self {
        let level = series.values();
        let diff1 = difference(level, 1);
        let diff2 = difference(level, 2);

        Self {
            adf_level: Panel::capture("ADF (level)", stationarity(level)),
            adf_first_difference: Panel::capture("ADF (1st difference)", stationarity(&diff1)),
            adf_second_difference: Panel::capture("ADF (2nd difference)", stationarity(&diff2)),
            decomposition: Panel::capture("Decomposition", decompose(level, 1.0)),
            correlogram: Panel::capture(
                "ACF/PACF",
                correlogram(&diff2, default_max_lag(diff2.len())),
            ),
        }
    }

    /// Warning messages of every failed panel.
    pub fn warnings(&self) -> Vec<&str> {
        [
            self.adf_level.warning(),
            self.adf_first_difference.warning(),
            self.adf_second_difference.warning(),
            self.decomposition.warning(),
            self.correlogram.warning(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
