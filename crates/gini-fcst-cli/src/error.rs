//! Errors surfaced by the dashboard binary.

use std::process::ExitCode;

use gini_fcst_core::ForecastError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code.
    ///
    /// 2 for invalid parameters (same as clap usage errors), 3 for dataset
    /// problems, 1 for everything else.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    fn code(&self) -> u8 {
        match self {
            CliError::Forecast(e) if e.is_configuration() => 2,
            CliError::Forecast(ForecastError::Dataset(_) | ForecastError::MissingColumn(_)) => 3,
            _ => 1,
        }
    }

    /// Message shown to the user on stderr.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Forecast(e) if e.is_configuration() => {
                format!("Invalid parameter. {}", e)
            }
            CliError::Forecast(e @ ForecastError::InsufficientData { .. }) => {
                format!("Not enough data to fit the model. {}", e)
            }
            CliError::Forecast(ForecastError::Dataset(_) | ForecastError::MissingColumn(_)) => {
                format!("Cannot load the dataset. {}", self)
            }
            other => other.to_string(),
        }
    }
}
