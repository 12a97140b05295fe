//! # gini-dashboard
//!
//! Terminal rendition of the income-inequality forecasting dashboard. Each
//! subcommand is one CRISP-DM page; the dataset is loaded once per run and
//! every page is computed from it with the parameters on the command line.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use gini_fcst_core::Dataset;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod pages;
mod render;

use config::{Cli, DashboardConfig, OutputFormat};
use error::CliError;

fn init_tracing(config: &DashboardConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.default_log_filter().into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli, config: &DashboardConfig) -> Result<(), CliError> {
    let dataset = Dataset::from_path(&config.data, &config.target)?;
    let report = pages::build(&cli.page, &dataset, &config.target)?;

    for warning in report.warnings() {
        tracing::warn!(page = report.name(), "{}", warning);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.format {
        OutputFormat::Table => write!(out, "{}", report)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = DashboardConfig::from(&cli);
    init_tracing(&config);

    tracing::info!(data = %config.data.display(), target = %config.target, "starting dashboard");

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "page failed");
            eprintln!("error: {}", e.user_message());
            e.exit_code()
        }
    }
}
