//! Core library for the income-inequality forecasting dashboard.
//!
//! This crate provides the Rust implementation of the CRISP-DM pipeline
//! behind the dashboard: loading the annual indicator table, preparing the
//! target series, Brown's double exponential smoothing, multi-step
//! forecasting, accuracy evaluation and data-quality diagnostics.

pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod quality;
pub mod smoothing;
pub mod stats;

// Re-exports for convenience
pub use dataset::{
    column_description, Column, ColumnInfo, ColumnKind, Dataset, MissingCount, DEFAULT_TARGET,
    OPTIONAL_INDICATORS, YEAR_COLUMN,
};
pub use diagnostics::{
    correlogram, decompose, default_max_lag, difference, stationarity, AdfReport, Correlogram,
    Decomposition, Panel, TimeSeriesDiagnostics,
};
pub use error::{ForecastError, Result};
pub use forecast::{forecast_ahead, ForecastPoint, ForecastResult, Horizon, Trend, MAX_HORIZON};
pub use metrics::{evaluate, mae, mape, mse, rmse, AccuracyBand, ErrorRow, EvaluationResult};
pub use pipeline::{
    prepare, run_evaluation, run_modeling, understand, ChartData, Conclusion, EvaluationReport,
    InterpolatedColumn, InterpolatedValue, ModelRequest, ModelingReport, PreparationReport,
    UnderstandingReport,
};
pub use preprocess::{
    interpolate_by_period, interpolate_frame, preprocess, preprocess_with_counts, DropCounts,
    Observation, Series,
};
pub use quality::{iqr_outliers, OutlierReport, QualityCheck, QualityStatus, QualitySummary};
pub use smoothing::{Alpha, DoubleExponentialSmoothing, SmoothingRow, SmoothingState};
pub use stats::{describe, describe_dataset, Describe};
