//! Command-line configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gini_fcst_core::{Alpha, ForecastError, Horizon, ModelRequest, Result, DEFAULT_TARGET};

/// Dataset used when neither `--data` nor `GINI_DATASET` is given.
pub const DEFAULT_DATASET: &str = "data/gini_south_africa.csv";

#[derive(Debug, Parser)]
#[command(name = "gini-dashboard", version)]
#[command(about = "Income inequality forecasting dashboard (CRISP-DM)", long_about = None)]
pub struct Cli {
    /// CSV dataset with a Year column and the target indicator
    #[arg(long, env = "GINI_DATASET", default_value = DEFAULT_DATASET, global = true)]
    pub data: PathBuf,

    /// Column to forecast
    #[arg(long, default_value = DEFAULT_TARGET, global = true)]
    pub target: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Log computation details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub page: Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Dashboard pages, in CRISP-DM order.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Page {
    /// Background, goals and methodology
    Business,
    /// Dataset overview, descriptive statistics and quality checks
    Understanding,
    /// Interpolation, column selection, stationarity and outliers
    Preparation,
    /// Double exponential smoothing table and future forecasts
    Modeling(ModelArgs),
    /// Accuracy metrics and conclusion
    Evaluation(ModelArgs),
}

/// Smoothing controls shared by the modeling and evaluation pages.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct ModelArgs {
    /// Smoothing constant, strictly between 0 and 1
    #[arg(long, default_value_t = Alpha::DEFAULT, allow_negative_numbers = true)]
    pub alpha: f64,

    /// Number of future periods to forecast
    #[arg(long, default_value_t = Horizon::DEFAULT as i64, allow_negative_numbers = true)]
    pub horizon: i64,
}

impl ModelArgs {
    /// Validate the raw controls.
    pub fn request(&self) -> Result<ModelRequest> {
        let horizon =
            usize::try_from(self.horizon).map_err(|_| ForecastError::InvalidParameter {
                param: "horizon".to_string(),
                value: self.horizon.to_string(),
                reason: "must be positive".to_string(),
            })?;
        ModelRequest::new(self.alpha, horizon)
    }
}

/// Settings shared by every page.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data: PathBuf,
    pub target: String,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl DashboardConfig {
    /// Default `EnvFilter` directives when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "gini_dashboard=debug,gini_fcst_core=debug"
        } else {
            "gini_dashboard=info,gini_fcst_core=warn"
        }
    }
}

impl From<&Cli> for DashboardConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            data: cli.data.clone(),
            target: cli.target.clone(),
            format: cli.format,
            verbose: cli.verbose,
        }
    }
}
