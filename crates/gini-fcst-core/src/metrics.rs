//! Evaluation metrics for one-step-ahead forecasts.
//!
//! - **Scale-dependent metrics**: MAE, MSE, RMSE
//! - **Percentage metrics**: MAPE, banded into qualitative accuracy classes
//!
//! # Sample sizes
//!
//! MAE, MSE and RMSE average over every evaluated period. MAPE skips periods
//! whose actual value is exactly zero, so its effective sample size can be
//! smaller. [`EvaluationResult`] reports both counts (`n_evaluated` and
//! `n_mape`) so the difference is visible to the reader.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::smoothing::SmoothingState;

/// Calculates Mean Absolute Error between actual and predicted values.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - forecast_i|
///
/// # Example
/// ```
/// use gini_fcst_core::metrics::mae;
/// let actual = vec![1.0, 2.0, 3.0];
/// let forecast = vec![1.1, 2.2, 2.8];
/// let error = mae(&actual, &forecast).unwrap();
/// assert!((error - 0.166).abs() < 0.01);
/// ```
pub fn mae(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Mean Squared Error between actual and predicted values.
///
/// # Formula
/// MSE = (1/n) * Σ(actual_i - forecast_i)²
pub fn mse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Root Mean Squared Error between actual and predicted values.
///
/// # Formula
/// RMSE = √MSE
pub fn rmse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    Ok(mse(actual, forecast)?.sqrt())
}

/// Calculates Mean Absolute Percentage Error.
///
/// Periods where the actual value is zero are excluded from the average.
/// Returns `Ok(None)` when every actual value is zero: MAPE is not
/// computable, which is different from a MAPE of zero.
///
/// # Formula
/// MAPE = (100/k) * Σ|actual_i - forecast_i| / |actual_i|, over the k
/// periods with actual_i ≠ 0
pub fn mape(actual: &[f64], forecast: &[f64]) -> Result<Option<f64>> {
    validate_inputs(actual, forecast)?;
    let (sum, count) = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (a, f)| {
            (sum + ((a - f) / a).abs(), count + 1)
        });
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64 * 100.0))
}

/// Qualitative MAPE class. Thresholds are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    /// MAPE < 5%
    VeryGood,
    /// 5% <= MAPE < 10%
    Good,
    /// 10% <= MAPE < 20%
    Fair,
    /// MAPE >= 20%
    NeedsImprovement,
}

impl AccuracyBand {
    pub fn from_mape(mape: f64) -> Self {
        if mape < 5.0 {
            AccuracyBand::VeryGood
        } else if mape < 10.0 {
            AccuracyBand::Good
        } else if mape < 20.0 {
            AccuracyBand::Fair
        } else {
            AccuracyBand::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccuracyBand::VeryGood => "very good",
            AccuracyBand::Good => "good",
            AccuracyBand::Fair => "fair",
            AccuracyBand::NeedsImprovement => "needs improvement",
        }
    }

    /// Traffic-light marker.
    pub fn marker(&self) -> &'static str {
        match self {
            AccuracyBand::VeryGood => "🟢",
            AccuracyBand::Good => "🟡",
            AccuracyBand::Fair => "🟠",
            AccuracyBand::NeedsImprovement => "🔴",
        }
    }
}

impl std::fmt::Display for AccuracyBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-period forecast error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorRow {
    pub period: i32,
    pub actual: f64,
    pub forecast: f64,
    pub error: f64,
    pub abs_error: f64,
    pub squared_error: f64,
}

/// Accuracy of the in-sample one-step-ahead forecasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// `None` when every evaluated actual is zero
    pub mape: Option<f64>,
    /// Periods contributing to MAE/MSE/RMSE
    pub n_evaluated: usize,
    /// Periods contributing to MAPE (non-zero actuals)
    pub n_mape: usize,
    pub band: Option<AccuracyBand>,
    pub rows: Vec<ErrorRow>,
}

/// Evaluate the in-sample forecasts of a fitted state over t = 1..n-1.
pub fn evaluate(state: &SmoothingState) -> Result<EvaluationResult> {
    let (periods, actual, forecast) = state.forecast_pairs();

    let mae = mae(&actual, &forecast)?;
    let mse = mse(&actual, &forecast)?;
    let rmse = rmse(&actual, &forecast)?;
    let mape = mape(&actual, &forecast)?;
    let n_mape = actual.iter().filter(|a| **a != 0.0).count();

    let rows = periods
        .iter()
        .zip(actual.iter().zip(&forecast))
        .map(|(&period, (&a, &f))| {
            let error = a - f;
            ErrorRow {
                period,
                actual: a,
                forecast: f,
                error,
                abs_error: error.abs(),
                squared_error: error * error,
            }
        })
        .collect();

    tracing::debug!(
        n_evaluated = actual.len(),
        n_mape,
        mae,
        rmse,
        ?mape,
        "forecast evaluated"
    );

    Ok(EvaluationResult {
        mae,
        mse,
        rmse,
        mape,
        n_evaluated: actual.len(),
        n_mape,
        band: mape.map(AccuracyBand::from_mape),
        rows,
    })
}

/// Validate that inputs have the same length and are non-empty.
fn validate_inputs(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() {
        return Err(ForecastError::InvalidInput(format!(
            "Actual and forecast arrays must have the same length: {} vs {}",
            actual.len(),
            forecast.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::Series;
    use crate::smoothing::{Alpha, DoubleExponentialSmoothing};
    use approx::assert_relative_eq;

    #[test]
    fn test_mae() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let forecast = vec![1.1, 2.2, 2.9, 4.1, 4.8];
        let result = mae(&actual, &forecast).unwrap();
        assert_relative_eq!(result, 0.14, epsilon = 0.01);
    }

    #[test]
    fn test_mse() {
        let actual = vec![1.0, 2.0, 3.0];
        let forecast = vec![1.0, 2.0, 4.0];
        let result = mse(&actual, &forecast).unwrap();
        assert_relative_eq!(result, 1.0 / 3.0, epsilon = 0.01);
    }

    #[test]
    fn test_rmse() {
        let actual = vec![1.0, 2.0, 3.0];
        let forecast = vec![1.0, 2.0, 4.0];
        let result = rmse(&actual, &forecast).unwrap();
        // MSE = 1/3, RMSE = sqrt(1/3) ≈ 0.577
        assert_relative_eq!(result, (1.0_f64 / 3.0).sqrt(), epsilon = 0.001);
    }

    #[test]
    fn test_mape() {
        let actual = vec![100.0, 200.0, 300.0];
        let forecast = vec![110.0, 180.0, 330.0];
        // Errors: 10%, 10%, 10% -> MAPE = 10%
        let result = mape(&actual, &forecast).unwrap().unwrap();
        assert_relative_eq!(result, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mape_with_zeros() {
        // Zero actual is skipped by MAPE but still counted by MAE
        let actual = vec![0.0, 100.0, 200.0];
        let forecast = vec![10.0, 110.0, 180.0];
        let result = mape(&actual, &forecast).unwrap().unwrap();
        assert_relative_eq!(result, 10.0, epsilon = 1e-9);
        assert_relative_eq!(mae(&actual, &forecast).unwrap(), 40.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mape_all_zero_not_computable() {
        assert_eq!(mape(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), None);
    }

    #[test]
    fn test_length_mismatch() {
        let result = mae(&[1.0, 2.0], &[1.0]);
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
        assert!(matches!(
            mse(&[], &[]),
            Err(ForecastError::InsufficientData { needed: 1, got: 0 })
        ));
    }

    #[test]
    fn test_accuracy_bands() {
        assert_eq!(AccuracyBand::from_mape(0.0), AccuracyBand::VeryGood);
        assert_eq!(AccuracyBand::from_mape(4.99), AccuracyBand::VeryGood);
        assert_eq!(AccuracyBand::from_mape(5.0), AccuracyBand::Good);
        assert_eq!(AccuracyBand::from_mape(10.0), AccuracyBand::Fair);
        assert_eq!(AccuracyBand::from_mape(19.9), AccuracyBand::Fair);
        assert_eq!(AccuracyBand::from_mape(20.0), AccuracyBand::NeedsImprovement);
        assert_eq!(AccuracyBand::NeedsImprovement.label(), "needs improvement");
        assert_eq!(AccuracyBand::VeryGood.marker(), "🟢");
    }

    #[test]
    fn test_evaluate_skips_warm_up() {
        let series = Series::new(
            vec![2000, 2001, 2002, 2003, 2004],
            vec![0.60, 0.62, 0.61, 0.63, 0.65],
        )
        .unwrap();
        let state = DoubleExponentialSmoothing::new(Alpha::new(0.5).unwrap())
            .fit(&series)
            .unwrap();
        let eval = evaluate(&state).unwrap();

        assert_eq!(eval.n_evaluated, 4);
        assert_eq!(eval.n_mape, 4);
        assert_eq!(eval.rows.len(), 4);
        assert_eq!(eval.rows[0].period, 2001);
        // forecast(2001) = Y[0] = 0.60
        assert_relative_eq!(eval.rows[0].error, 0.02, epsilon = 1e-12);
        assert_relative_eq!(eval.rmse, eval.mse.sqrt(), epsilon = 1e-15);
        assert_eq!(eval.band, Some(AccuracyBand::VeryGood));

        let mean_abs: f64 = eval.rows.iter().map(|r| r.abs_error).sum::<f64>() / 4.0;
        assert_relative_eq!(eval.mae, mean_abs, epsilon = 1e-15);
    }

    #[test]
    fn test_evaluate_zero_actual_changes_mape_sample() {
        let series = Series::new(vec![1, 2, 3, 4], vec![1.0, 0.0, 2.0, 3.0]).unwrap();
        let state = DoubleExponentialSmoothing::new(Alpha::new(0.5).unwrap())
            .fit(&series)
            .unwrap();
        let eval = evaluate(&state).unwrap();
        assert_eq!(eval.n_evaluated, 3);
        assert_eq!(eval.n_mape, 2);
        assert!(eval.mape.is_some());
    }
}
