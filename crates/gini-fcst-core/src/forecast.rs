//! Multi-step forecasting from a fitted smoothing state.
//!
//! Future values are a straight-line extrapolation of the final level and
//! trend: `F(n-1+k) = a[n-1] + b[n-1] * k`. These are point forecasts only;
//! no uncertainty band is attached.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::smoothing::SmoothingState;

/// Upper bound on the forecast horizon.
pub const MAX_HORIZON: usize = 20;

/// Number of periods to forecast beyond the last observation (1..=20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Horizon(usize);

impl Horizon {
    /// Default used by the dashboard controls.
    pub const DEFAULT: usize = 5;

    pub fn new(value: usize) -> Result<Self> {
        if value == 0 || value > MAX_HORIZON {
            return Err(ForecastError::invalid_parameter(
                "horizon",
                value,
                format!("must be between 1 and {}", MAX_HORIZON),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Horizon {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| ForecastError::invalid_parameter("horizon", s, "not a positive integer"))?;
        Self::new(value)
    }
}

/// A forecast value for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub period: i32,
    pub value: f64,
}

/// Direction of the projected path relative to the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    /// Compare the final forecast against the last actual value.
    pub fn between(last_actual: f64, last_forecast: f64) -> Self {
        let delta = last_forecast - last_actual;
        if delta.abs() <= f64::EPSILON * last_actual.abs().max(1.0) {
            Trend::Flat
        } else if delta > 0.0 {
            Trend::Rising
        } else {
            Trend::Falling
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Flat => "flat",
        }
    }
}

/// In-sample one-step-ahead forecasts and out-of-sample extrapolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Periods 1..n-1 of the observed series
    pub in_sample: Vec<ForecastPoint>,
    /// Periods strictly after the last observation
    pub out_of_sample: Vec<ForecastPoint>,
    /// Direction from the last actual to the last future value
    pub trend: Trend,
}

impl ForecastResult {
    /// Partition a fitted state into in-sample and future forecasts.
    pub fn from_state(state: &SmoothingState, horizon: Horizon) -> Result<Self> {
        let last_actual = state
            .actual
            .last()
            .copied()
            .ok_or(ForecastError::InsufficientData { needed: 2, got: 0 })?;

        let in_sample = state
            .periods
            .iter()
            .zip(&state.forecast)
            .filter_map(|(&period, f)| f.map(|value| ForecastPoint { period, value }))
            .collect();

        let out_of_sample = forecast_ahead(state, horizon)?;
        let last_forecast = out_of_sample
            .last()
            .map(|p| p.value)
            .unwrap_or(last_actual);

        Ok(Self {
            in_sample,
            out_of_sample,
            trend: Trend::between(last_actual, last_forecast),
        })
    }

    /// Last future point.
    pub fn final_point(&self) -> Option<&ForecastPoint> {
        self.out_of_sample.last()
    }
}

/// Extrapolate the final level and trend `horizon` periods ahead.
pub fn forecast_ahead(state: &SmoothingState, horizon: Horizon) -> Result<Vec<ForecastPoint>> {
    let last_period = state
        .last_period()
        .ok_or(ForecastError::InsufficientData { needed: 2, got: 0 })?;
    let level = state.final_level();
    let trend = state.final_trend();

    let points = (1..=horizon.get())
        .map(|k| {
            let period = i32::try_from(k)
                .ok()
                .and_then(|k| last_period.checked_add(k))
                .ok_or_else(|| {
                    ForecastError::InvalidInput(format!(
                        "Forecast period {} + {} is out of range",
                        last_period, k
                    ))
                })?;
            Ok(ForecastPoint {
                period,
                value: level + trend * k as f64,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(horizon = horizon.get(), level, trend, "multi-step forecast");
    Ok(points)
}
