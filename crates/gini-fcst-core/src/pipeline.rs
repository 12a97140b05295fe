//! Per-request computations behind each dashboard page.
//!
//! Every function here is a pure function of the shared, read-only dataset
//! and the caller's parameters. Nothing is cached between calls, so two
//! sessions asking for different α values never see each other's results.

use serde::Serialize;

use crate::dataset::{column_description, ColumnInfo, Dataset, MissingCount};
use crate::diagnostics::TimeSeriesDiagnostics;
use crate::error::Result;
use crate::forecast::{ForecastPoint, ForecastResult, Horizon, Trend};
use crate::metrics::{evaluate, AccuracyBand, EvaluationResult};
use crate::preprocess::{interpolate_frame, preprocess, preprocess_with_counts, Series};
use crate::quality::{iqr_outliers, OutlierReport, QualitySummary};
use crate::smoothing::{Alpha, DoubleExponentialSmoothing, SmoothingState};
use crate::stats::{describe, describe_dataset, Describe};

/// Parameters of one modeling or evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ModelRequest {
    pub alpha: Alpha,
    pub horizon: Horizon,
}

impl ModelRequest {
    /// Validate raw control values.
    pub fn new(alpha: f64, horizon: usize) -> Result<Self> {
        Ok(Self {
            alpha: Alpha::new(alpha)?,
            horizon: Horizon::new(horizon)?,
        })
    }
}

/// Data Understanding page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderstandingReport {
    pub target: String,
    pub rows: usize,
    pub year_range: Option<(i32, i32)>,
    pub column_types: Vec<ColumnInfo>,
    pub describe: Vec<(String, Describe)>,
    /// Target values in year order
    pub target_series: Vec<(i32, Option<f64>)>,
    pub quality: QualitySummary,
}

pub fn understand(dataset: &Dataset, target: &str) -> Result<UnderstandingReport> {
    let sorted = dataset.sorted_by_year();
    let target_series = sorted
        .years()
        .iter()
        .copied()
        .zip(sorted.numeric(target)?.iter().copied())
        .collect();

    Ok(UnderstandingReport {
        target: target.to_string(),
        rows: dataset.len(),
        year_range: dataset.year_range(),
        column_types: dataset.column_types(),
        describe: describe_dataset(dataset)?,
        target_series,
        quality: QualitySummary::compute(dataset, target)?,
    })
}

/// A selected column and what it measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedColumn {
    pub name: String,
    pub description: String,
}

/// IQR outliers of one indicator after interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub report: OutlierReport,
    pub values: Vec<f64>,
}

/// Value of one indicator in one year, before and after interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterpolatedValue {
    pub year: i32,
    pub raw: Option<f64>,
    pub filled: Option<f64>,
}

impl InterpolatedValue {
    /// Whether interpolation supplied this value.
    pub fn was_filled(&self) -> bool {
        self.raw.is_none() && self.filled.is_some()
    }
}

/// Before-vs-after interpolation comparison of one selected indicator,
/// in year order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpolatedColumn {
    pub column: String,
    pub values: Vec<InterpolatedValue>,
}

impl InterpolatedColumn {
    /// Values that interpolation supplied.
    pub fn filled(&self) -> impl Iterator<Item = &InterpolatedValue> {
        self.values.iter().filter(|v| v.was_filled())
    }
}

/// Data Preparation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparationReport {
    pub target: String,
    pub missing_before: Vec<MissingCount>,
    pub missing_after: Vec<MissingCount>,
    /// Selected numeric columns, target first
    pub interpolation: Vec<InterpolatedColumn>,
    pub selected: Vec<SelectedColumn>,
    /// Prepared target series
    pub series: Series,
    pub describe: Describe,
    pub diagnostics: TimeSeriesDiagnostics,
    pub outliers: Vec<ColumnOutliers>,
}

/// Sort and interpolate, select the analysis columns, then run the
/// time-series diagnostics on the target.
pub fn prepare(dataset: &Dataset, target: &str) -> Result<PreparationReport> {
    let raw = dataset.sorted_by_year().select_columns(target)?;
    let filled = interpolate_frame(dataset)?;
    let filtered = filled.select_columns(target)?;

    let mut interpolation = Vec::new();
    for column in filtered.numeric_columns() {
        let values = raw
            .years()
            .iter()
            .zip(raw.numeric(column)?)
            .zip(filtered.numeric(column)?)
            .map(|((&year, &raw), &filled)| InterpolatedValue { year, raw, filled })
            .collect();
        interpolation.push(InterpolatedColumn {
            column: column.to_string(),
            values,
        });
    }

    let selected = std::iter::once(crate::dataset::YEAR_COLUMN)
        .chain(filtered.column_names())
        .map(|name| SelectedColumn {
            name: name.to_string(),
            description: column_description(name).to_string(),
        })
        .collect();

    let series = preprocess(&dataset.observations(target)?);
    let describe = describe(&series.values().iter().map(|v| Some(*v)).collect::<Vec<_>>());
    let diagnostics = TimeSeriesDiagnostics::compute(&series);

    let mut outliers = Vec::new();
    for column in filtered.numeric_columns() {
        let values: Vec<f64> = filtered.numeric(column)?.iter().flatten().copied().collect();
        let report = iqr_outliers(&values);
        outliers.push(ColumnOutliers {
            column: column.to_string(),
            values: report.values(&values),
            report,
        });
    }

    Ok(PreparationReport {
        target: target.to_string(),
        missing_before: dataset.missing_counts(),
        missing_after: filled.missing_counts(),
        interpolation,
        selected,
        series,
        describe,
        diagnostics,
        outliers,
    })
}

/// Data for the actual vs forecast chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub actual: Vec<ForecastPoint>,
    pub in_sample: Vec<ForecastPoint>,
    pub future: Vec<ForecastPoint>,
    /// Last observed period; future values start after it
    pub cutoff: i32,
}

/// Modeling page: smoothing table and future forecasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelingReport {
    pub target: String,
    pub request: ModelRequest,
    pub series: Series,
    /// Missing observations outside the interpolated range, dropped
    pub n_dropped: usize,
    /// Repeated periods dropped after the first
    pub n_duplicates: usize,
    pub smoothing: SmoothingState,
    pub forecast: ForecastResult,
}

impl ModelingReport {
    pub fn chart(&self) -> ChartData {
        ChartData {
            actual: self
                .series
                .periods()
                .iter()
                .zip(self.series.values())
                .map(|(&period, &value)| ForecastPoint { period, value })
                .collect(),
            in_sample: self.forecast.in_sample.clone(),
            future: self.forecast.out_of_sample.clone(),
            cutoff: self.series.last_period().unwrap_or_default(),
        }
    }
}

/// Prepare the target, fit the model and extrapolate.
pub fn run_modeling(
    dataset: &Dataset,
    target: &str,
    request: &ModelRequest,
) -> Result<ModelingReport> {
    let observations = dataset.observations(target)?;
    let (series, dropped) = preprocess_with_counts(&observations);
    if dropped.unresolved > 0 {
        tracing::warn!(
            target,
            n_dropped = dropped.unresolved,
            "observations outside the interpolated range dropped"
        );
    }
    if dropped.duplicates > 0 {
        tracing::warn!(target, n_duplicates = dropped.duplicates, "duplicate periods dropped");
    }

    let smoothing = DoubleExponentialSmoothing::new(request.alpha).fit(&series)?;
    let forecast = ForecastResult::from_state(&smoothing, request.horizon)?;

    tracing::debug!(
        target,
        alpha = request.alpha.get(),
        horizon = request.horizon.get(),
        n = series.len(),
        "modeling run complete"
    );

    Ok(ModelingReport {
        target: target.to_string(),
        request: *request,
        series,
        n_dropped: dropped.unresolved,
        n_duplicates: dropped.duplicates,
        smoothing,
        forecast,
    })
}

/// Closing statement of the evaluation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub alpha: Alpha,
    pub mape: Option<f64>,
    pub band: Option<AccuracyBand>,
    pub horizon: Horizon,
    pub trend: Trend,
    pub last_actual: f64,
    pub final_forecast: f64,
    pub final_period: i32,
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Double exponential smoothing with α = {} ", self.alpha)?;
        match (self.mape, self.band) {
            (Some(mape), Some(band)) => write!(f, "reaches a MAPE of {:.2}% ({}). ", mape, band)?,
            _ => write!(f, "has no computable MAPE. ")?,
        }
        write!(
            f,
            "The {}-year forecast is {} from the last value {:.4} to {:.4} in {}.",
            self.horizon,
            self.trend.label(),
            self.last_actual,
            self.final_forecast,
            self.final_period
        )
    }
}

/// Evaluation page: modeling output plus accuracy metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub modeling: ModelingReport,
    pub evaluation: EvaluationResult,
    pub conclusion: Conclusion,
}

pub fn run_evaluation(
    dataset: &Dataset,
    target: &str,
    request: &ModelRequest,
) -> Result<EvaluationReport> {
    let modeling = run_modeling(dataset, target, request)?;
    let evaluation = evaluate(&modeling.smoothing)?;

    let last_actual = modeling.smoothing.actual.last().copied().unwrap_or(f64::NAN);
    let (final_period, final_forecast) = modeling
        .forecast
        .final_point()
        .map(|p| (p.period, p.value))
        .unwrap_or((0, f64::NAN));

    let conclusion = Conclusion {
        alpha: request.alpha,
        mape: evaluation.mape,
        band: evaluation.band,
        horizon: request.horizon,
        trend: modeling.forecast.trend,
        last_actual,
        final_forecast,
        final_period,
    };

    Ok(EvaluationReport {
        modeling,
        evaluation,
        conclusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use approx::assert_relative_eq;

    const CSV: &str = "\
Year,gini_disp,gini_mkt,GDP,Country
2003,0.63,0.70,,ZA
2000,0.60,0.68,100.0,ZA
2001,0.62,,105.0,ZA
2002,,0.69,110.0,ZA
2004,0.65,0.72,120.0,ZA
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), "gini_disp").unwrap()
    }

    #[test]
    fn test_model_request_validation() {
        assert!(ModelRequest::new(0.6, 5).is_ok());
        assert!(ModelRequest::new(1.0, 5).unwrap_err().is_configuration());
        assert!(ModelRequest::new(0.5, 0).unwrap_err().is_configuration());
        let request = ModelRequest::default();
        assert_eq!(request.alpha.get(), 0.60);
        assert_eq!(request.horizon.get(), 5);
    }

    #[test]
    fn test_run_modeling() {
        let request = ModelRequest::new(0.5, 3).unwrap();
        let report = run_modeling(&dataset(), "gini_disp", &request).unwrap();
        assert_eq!(report.series.periods(), &[2000, 2001, 2002, 2003, 2004]);
        assert_relative_eq!(report.series.values()[2], 0.625, epsilon = 1e-12);
        assert_eq!(report.n_dropped, 0);
        assert_eq!(report.forecast.out_of_sample.len(), 3);

        let chart = report.chart();
        assert_eq!(chart.cutoff, 2004);
        assert_eq!(chart.actual.len(), 5);
        assert_eq!(chart.in_sample.len(), 4);
        assert_eq!(chart.future[0].period, 2005);
    }

    #[test]
    fn test_runs_are_independent() {
        let ds = dataset();
        let a = run_modeling(&ds, "gini_disp", &ModelRequest::new(0.2, 5).unwrap()).unwrap();
        let b = run_modeling(&ds, "gini_disp", &ModelRequest::new(0.8, 5).unwrap()).unwrap();
        let a_again = run_modeling(&ds, "gini_disp", &ModelRequest::new(0.2, 5).unwrap()).unwrap();
        assert_ne!(a.smoothing.s1, b.smoothing.s1);
        assert_eq!(a, a_again);
    }

    #[test]
    fn test_run_evaluation_conclusion() {
        let report =
            run_evaluation(&dataset(), "gini_disp", &ModelRequest::new(0.5, 2).unwrap()).unwrap();
        assert_eq!(report.evaluation.n_evaluated, 4);
        assert_eq!(report.conclusion.final_period, 2006);
        assert_eq!(report.conclusion.trend, Trend::Rising);
        let text = report.conclusion.to_string();
        assert!(text.contains("α = 0.50"));
        assert!(text.contains("2006"));
    }

    #[test]
    fn test_insufficient_data() {
        let csv = "Year,gini_disp\n2000,0.6\n2001,\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "gini_disp").unwrap();
        let err = run_modeling(&ds, "gini_disp", &ModelRequest::default()).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { needed: 2, got: 1 }
        ));
    }

    #[test]
    fn test_understand() {
        let report = understand(&dataset(), "gini_disp").unwrap();
        assert_eq!(report.rows, 5);
        assert_eq!(report.year_range, Some((2000, 2004)));
        assert_eq!(report.target_series[0], (2000, Some(0.60)));
        assert_eq!(report.quality.missing.count, 1);
        assert_eq!(report.describe.len(), 3);
    }

    #[test]
    fn test_prepare_compares_raw_and_interpolated() {
        let report = prepare(&dataset(), "gini_disp").unwrap();
        let gini = &report.interpolation[0];
        let years: Vec<i32> = gini.values.iter().map(|v| v.year).collect();
        assert_eq!(years, vec![2000, 2001, 2002, 2003, 2004]);

        let filled: Vec<&InterpolatedValue> = gini.filled().collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].year, 2002);
        assert_eq!(filled[0].raw, None);
        assert_relative_eq!(filled[0].filled.unwrap(), 0.625, epsilon = 1e-12);
        assert_eq!(gini.values[0].raw, gini.values[0].filled);

        // GDP is blank in the first file row (2003), an interior gap once sorted.
        let gdp = &report.interpolation[2];
        let gdp_2003 = gdp.values.iter().find(|v| v.year == 2003).unwrap();
        assert!(gdp_2003.was_filled());
        assert_relative_eq!(gdp_2003.filled.unwrap(), 115.0, epsilon = 1e-9);
    }

    #[test]
    fn test_modeling_counts_duplicates_separately() {
        let csv = "Year,gini_disp\n2000,\n2001,0.61\n2002,0.62\n2002,0.70\n2003,0.63\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "gini_disp").unwrap();
        let report = run_modeling(&ds, "gini_disp", &ModelRequest::default()).unwrap();
        assert_eq!(report.series.periods(), &[2001, 2002, 2003]);
        assert_eq!(report.n_dropped, 1);
        assert_eq!(report.n_duplicates, 1);
    }

    #[test]
    fn test_prepare() {
        let report = prepare(&dataset(), "gini_disp").unwrap();
        let names: Vec<&str> = report.selected.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Year", "gini_disp", "gini_mkt", "GDP"]);

        let before = report.missing_before.iter().find(|m| m.column == "gini_disp").unwrap();
        let after = report.missing_after.iter().find(|m| m.column == "gini_disp").unwrap();
        assert_eq!(before.count, 1);
        assert_eq!(after.count, 0);

        let columns: Vec<&str> = report.interpolation.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["gini_disp", "gini_mkt", "GDP"]);

        assert_eq!(report.series.len(), 5);
        assert_eq!(report.describe.count, 5);
        assert_eq!(report.outliers.len(), 3);
        // Five points are too few for every diagnostic; failures are warnings.
        assert!(!report.diagnostics.warnings().is_empty());
    }
}
