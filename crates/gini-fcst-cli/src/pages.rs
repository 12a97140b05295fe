//! The five dashboard pages.
//!
//! [`build`] runs the computation behind a page; the resulting
//! [`PageReport`] serializes to JSON or renders as text through `Display`.

use std::fmt;

use gini_fcst_core::{
    describe, prepare, run_evaluation, run_modeling, understand, AdfReport, ChartData, Dataset,
    EvaluationReport, ForecastPoint, InterpolatedColumn, MissingCount, ModelingReport, Panel, PreparationReport,
    Result, UnderstandingReport,
};
use serde::Serialize;

use crate::config::Page;
use crate::render::{chart, heading, num, opt_num, subheading, Table};

const CHART_HEIGHT: usize = 12;

/// Static content of the Business Understanding page plus dataset facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessReport {
    pub target: String,
    pub rows: usize,
    pub year_range: Option<(i32, i32)>,
    pub background: &'static str,
    pub business_goals: &'static [&'static str],
    pub data_mining_goals: &'static [&'static str],
    pub key_question: &'static str,
    pub methodology: &'static [(&'static str, &'static str)],
}

const BACKGROUND: &str = "South Africa has one of the highest levels of income inequality in \
the world. The Gini coefficient is the main indicator of how income is distributed across a \
population.";

const BUSINESS_GOALS: &[&str] = &[
    "Understand the trend of income inequality in South Africa",
    "Forecast future values of the Gini coefficient",
    "Provide insight for economic policy",
    "Support data-driven decision making",
];

const DATA_MINING_GOALS: &[&str] = &[
    "Build a time-series forecasting model",
    "Use double exponential smoothing (Brown's linear method)",
    "Tune the smoothing constant α for accuracy",
    "Reach a MAPE below 10% (good accuracy)",
];

const KEY_QUESTION: &str = "How will income inequality in South Africa develop over the next \
few years, and are current policies effective at reducing it?";

const METHODOLOGY: &[(&str, &str)] = &[
    (
        "Business Understanding",
        "Identify the business problem, the analysis goals, scope and success criteria.",
    ),
    (
        "Data Understanding",
        "Explore structure, patterns and quality: missing values, duplicates, outliers.",
    ),
    (
        "Data Preparation",
        "Sort, interpolate gaps and select the attributes used for modeling.",
    ),
    (
        "Modeling",
        "Fit double exponential smoothing and project the series forward.",
    ),
    (
        "Evaluation",
        "Measure in-sample accuracy (MAE, MSE, RMSE, MAPE) against the business goal.",
    ),
    (
        "Deployment",
        "Publish the results as a dashboard and monitor them as new data arrives.",
    ),
];

impl BusinessReport {
    pub fn new(dataset: &Dataset, target: &str) -> Self {
        Self {
            target: target.to_string(),
            rows: dataset.len(),
            year_range: dataset.year_range(),
            background: BACKGROUND,
            business_goals: BUSINESS_GOALS,
            data_mining_goals: DATA_MINING_GOALS,
            key_question: KEY_QUESTION,
            methodology: METHODOLOGY,
        }
    }
}

/// Result of one page computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", content = "report", rename_all = "snake_case")]
pub enum PageReport {
    Business(BusinessReport),
    Understanding(UnderstandingReport),
    Preparation(PreparationReport),
    Modeling(ModelingReport),
    Evaluation(EvaluationReport),
}

/// Run the computation behind `page`.
pub fn build(page: &Page, dataset: &Dataset, target: &str) -> Result<PageReport> {
    let report = match page {
        Page::Business => PageReport::Business(BusinessReport::new(dataset, target)),
        Page::Understanding => PageReport::Understanding(understand(dataset, target)?),
        Page::Preparation => PageReport::Preparation(prepare(dataset, target)?),
        Page::Modeling(args) => {
            PageReport::Modeling(run_modeling(dataset, target, &args.request()?)?)
        }
        Page::Evaluation(args) => {
            PageReport::Evaluation(run_evaluation(dataset, target, &args.request()?)?)
        }
    };
    tracing::debug!(page = report.name(), "page computed");
    Ok(report)
}

impl PageReport {
    pub fn name(&self) -> &'static str {
        match self {
            PageReport::Business(_) => "business",
            PageReport::Understanding(_) => "understanding",
            PageReport::Preparation(_) => "preparation",
            PageReport::Modeling(_) => "modeling",
            PageReport::Evaluation(_) => "evaluation",
        }
    }

    /// Panel failures that were rendered as warnings.
    pub fn warnings(&self) -> Vec<String> {
        match self {
            PageReport::Preparation(r) => {
                r.diagnostics.warnings().into_iter().map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageReport::Business(r) => write_business(f, r),
            PageReport::Understanding(r) => write_understanding(f, r),
            PageReport::Preparation(r) => write_preparation(f, r),
            PageReport::Modeling(r) => write_modeling(f, r),
            PageReport::Evaluation(r) => write_evaluation(f, r),
        }
    }
}

fn year_range_text(range: Option<(i32, i32)>) -> String {
    range.map_or_else(|| "-".to_string(), |(lo, hi)| format!("{}-{}", lo, hi))
}

fn write_business(f: &mut fmt::Formatter<'_>, r: &BusinessReport) -> fmt::Result {
    write!(f, "{}", heading("Business Understanding"))?;
    writeln!(f, "{}", r.background)?;

    write!(f, "{}", subheading("Business goals"))?;
    for goal in r.business_goals {
        writeln!(f, "  - {}", goal)?;
    }
    write!(f, "{}", subheading("Data mining goals"))?;
    for goal in r.data_mining_goals {
        writeln!(f, "  - {}", goal)?;
    }

    write!(f, "{}", subheading("Dataset"))?;
    writeln!(f, "  Country:     South Africa")?;
    writeln!(f, "  Data points: {}", r.rows)?;
    writeln!(f, "  Years:       {}", year_range_text(r.year_range))?;
    writeln!(f, "  Target:      {}", r.target)?;

    write!(f, "{}", subheading("Key question"))?;
    writeln!(f, "  \"{}\"", r.key_question)?;

    write!(f, "{}", subheading("CRISP-DM methodology"))?;
    for (i, (phase, summary)) in r.methodology.iter().enumerate() {
        writeln!(f, "  {}. {}: {}", i + 1, phase, summary)?;
    }
    Ok(())
}

fn write_understanding(f: &mut fmt::Formatter<'_>, r: &UnderstandingReport) -> fmt::Result {
    write!(f, "{}", heading("Data Understanding"))?;
    writeln!(f, "  Rows:   {}", r.rows)?;
    writeln!(f, "  Years:  {}", year_range_text(r.year_range))?;
    writeln!(f, "  Target: {}", r.target)?;

    write!(f, "{}", subheading("Column types"))?;
    let mut types = Table::new(["Column", "Type"]);
    for info in &r.column_types {
        types.row([info.name.clone(), format!("{:?}", info.kind).to_lowercase()]);
    }
    write!(f, "{}", types)?;

    write!(f, "{}", subheading("Descriptive statistics"))?;
    let mut stats = Table::new([
        "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
    ]);
    for (name, d) in &r.describe {
        stats.row([
            name.clone(),
            d.count.to_string(),
            num(d.mean, 4),
            num(d.std, 4),
            num(d.min, 4),
            num(d.q25, 4),
            num(d.median, 4),
            num(d.q75, 4),
            num(d.max, 4),
        ]);
    }
    write!(f, "{}", stats)?;

    write!(f, "{}", subheading(&format!("Trend of {}", r.target)))?;
    let actual: Vec<ForecastPoint> = r
        .target_series
        .iter()
        .filter_map(|&(period, value)| value.map(|value| ForecastPoint { period, value }))
        .collect();
    let target_stats = describe(&r.target_series.iter().map(|&(_, v)| v).collect::<Vec<_>>());
    let cutoff = actual.last().map_or(0, |p| p.period);
    write!(
        f,
        "{}",
        chart(
            &ChartData {
                actual,
                in_sample: Vec::new(),
                future: Vec::new(),
                cutoff,
            },
            CHART_HEIGHT,
        )
    )?;
    writeln!(f)?;
    writeln!(f, "  Mean {}:           {}", r.target, num(target_stats.mean, 4))?;
    writeln!(f, "  Missing values (raw): {}", r.quality.missing.count)?;

    write!(f, "{}", subheading("Data quality"))?;
    let mut quality = Table::new(["Aspect", "Count", "Status"]);
    for check in [&r.quality.missing, &r.quality.duplicates, &r.quality.outliers] {
        quality.row([
            check.aspect.to_string(),
            check.count.to_string(),
            check.status_text(),
        ]);
    }
    write!(f, "{}", quality)?;
    let bounds = &r.quality.outlier_report;
    writeln!(
        f,
        "  IQR bounds: [{}, {}] (Q1 - 1.5 IQR, Q3 + 1.5 IQR)",
        num(bounds.lower, 4),
        num(bounds.upper, 4)
    )
}

fn adf_row(table: &mut Table, label: &str, panel: &Panel<AdfReport>) {
    match panel {
        Panel::Ready(adf) => {
            table.row([
                label.to_string(),
                num(adf.statistic, 4),
                num(adf.p_value, 4),
                adf.lags.to_string(),
                num(adf.critical_values.five_pct, 4),
                if adf.is_stationary {
                    "✅ stationary".to_string()
                } else {
                    "⚠️ not stationary".to_string()
                },
            ]);
        }
        Panel::Warning(msg) => {
            let mut cells = vec![label.to_string()];
            cells.extend(std::iter::repeat("-".to_string()).take(4));
            cells.push(format!("⚠️ {}", msg));
            table.row(cells);
        }
    }
}

fn missing_table(f: &mut fmt::Formatter<'_>, counts: &[MissingCount]) -> fmt::Result {
    let mut table = Table::new(["Column", "Missing", "%"]);
    for m in counts.iter().filter(|m| m.count > 0) {
        table.row([m.column.clone(), m.count.to_string(), num(m.percent, 2)]);
    }
    if table.is_empty() {
        writeln!(f, "  ✅ No missing values")
    } else {
        write!(f, "{}", table)
    }
}

/// Year-by-year raw and interpolated values of every column that had gaps
/// filled. Filled cells carry a `*`.
fn interpolation_table(
    f: &mut fmt::Formatter<'_>,
    columns: &[InterpolatedColumn],
) -> fmt::Result {
    let changed: Vec<&InterpolatedColumn> =
        columns.iter().filter(|c| c.filled().next().is_some()).collect();
    let Some(first) = changed.first() else {
        return writeln!(f, "  ✅ Nothing to interpolate");
    };

    let mut headers = vec!["Year".to_string()];
    for column in &changed {
        headers.push(format!("{} before", column.column));
        headers.push(format!("{} after", column.column));
    }
    let mut table = Table::new(headers);
    for (row, value) in first.values.iter().enumerate() {
        let mut cells = vec![value.year.to_string()];
        for column in &changed {
            let Some(v) = column.values.get(row) else {
                cells.extend(["-".to_string(), "-".to_string()]);
                continue;
            };
            let mut after = opt_num(v.filled, 4);
            if v.was_filled() {
                after.push('*');
            }
            cells.push(opt_num(v.raw, 4));
            cells.push(after);
        }
        table.row(cells);
    }
    writeln!(f, "\n  Before vs after interpolation (* = filled)")?;
    write!(f, "{}", table)
}

fn write_preparation(f: &mut fmt::Formatter<'_>, r: &PreparationReport) -> fmt::Result {
    write!(f, "{}", heading("Data Preparation"))?;

    write!(f, "{}", subheading("Step 1: Missing values before interpolation"))?;
    missing_table(f, &r.missing_before)?;

    write!(f, "{}", subheading("Step 2: Sorted by Year and linearly interpolated"))?;
    missing_table(f, &r.missing_after)?;
    interpolation_table(f, &r.interpolation)?;

    write!(f, "{}", subheading("Step 3: Selected columns"))?;
    let mut selected = Table::new(["Column", "Description"]);
    for column in &r.selected {
        selected.row([column.name.clone(), column.description.clone()]);
    }
    write!(f, "{}", selected)?;

    write!(f, "{}", subheading(&format!("Step 4: Time-series analysis of {}", r.target)))?;
    let d = &r.describe;
    let mut stats = Table::new(["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    stats.row([
        d.count.to_string(),
        num(d.mean, 4),
        num(d.std, 4),
        num(d.min, 4),
        num(d.q25, 4),
        num(d.median, 4),
        num(d.q75, 4),
        num(d.max, 4),
    ]);
    write!(f, "{}", stats)?;

    writeln!(f, "\n  Augmented Dickey-Fuller test (stationary when p < 0.05)")?;
    let mut adf = Table::new([
        "Series",
        "ADF statistic",
        "p-value",
        "lags",
        "5% critical",
        "Verdict",
    ]);
    adf_row(&mut adf, "level", &r.diagnostics.adf_level);
    adf_row(&mut adf, "1st difference", &r.diagnostics.adf_first_difference);
    adf_row(&mut adf, "2nd difference", &r.diagnostics.adf_second_difference);
    write!(f, "{}", adf)?;

    writeln!(f, "\n  Additive decomposition")?;
    match &r.diagnostics.decomposition {
        Panel::Ready(dec) => {
            let periods = r.series.periods();
            let mut table = Table::new(["Year", "Trend", "Seasonal", "Residual"]);
            for (i, &period) in periods.iter().enumerate() {
                table.row([
                    period.to_string(),
                    num(dec.trend.get(i).copied().unwrap_or(f64::NAN), 4),
                    num(dec.seasonal.get(i).copied().unwrap_or(f64::NAN), 4),
                    num(dec.remainder.get(i).copied().unwrap_or(f64::NAN), 4),
                ]);
            }
            write!(f, "{}", table)?;
        }
        Panel::Warning(msg) => writeln!(f, "  ⚠️ {}", msg)?,
    }

    writeln!(f, "\n  ACF / PACF of the 2nd difference")?;
    match &r.diagnostics.correlogram {
        Panel::Ready(c) => {
            let mut table = Table::new(["Lag", "ACF", "PACF"]);
            for ((lag, acf), pacf) in c.lags.iter().zip(&c.acf).zip(&c.pacf) {
                table.row([lag.to_string(), num(*acf, 4), num(*pacf, 4)]);
            }
            write!(f, "{}", table)?;
        }
        Panel::Warning(msg) => writeln!(f, "  ⚠️ {}", msg)?,
    }

    write!(f, "{}", subheading("Step 5: Outlier detection (IQR)"))?;
    let mut outliers = Table::new(["Column", "Q1", "Q3", "IQR", "Lower", "Upper", "Outliers"]);
    for column in &r.outliers {
        let report = &column.report;
        let listed = if column.values.is_empty() {
            "✅ none".to_string()
        } else {
            let values: Vec<String> = column.values.iter().map(|v| num(*v, 4)).collect();
            format!("⚠️ {} ({})", report.count(), values.join(", "))
        };
        outliers.row([
            column.column.clone(),
            num(report.q1, 4),
            num(report.q3, 4),
            num(report.iqr, 4),
            num(report.lower, 4),
            num(report.upper, 4),
            listed,
        ]);
    }
    write!(f, "{}", outliers)?;

    writeln!(
        f,
        "\n  Prepared series: {} observations, {}",
        r.series.len(),
        year_range_text(r.series.periods().first().copied().zip(r.series.last_period()))
    )
}

fn write_parameters(f: &mut fmt::Formatter<'_>, r: &ModelingReport) -> fmt::Result {
    writeln!(f, "  Target:  {}", r.target)?;
    writeln!(f, "  α:       {}", r.request.alpha)?;
    writeln!(f, "  Horizon: {} periods", r.request.horizon)?;
    writeln!(f, "  n:       {}", r.series.len())?;
    if r.n_dropped > 0 {
        writeln!(
            f,
            "  ⚠️ {} observations outside the interpolated range were dropped",
            r.n_dropped
        )?;
    }
    if r.n_duplicates > 0 {
        writeln!(
            f,
            "  ⚠️ {} repeated years were dropped (first value kept)",
            r.n_duplicates
        )?;
    }
    Ok(())
}

fn write_chart(f: &mut fmt::Formatter<'_>, r: &ModelingReport) -> fmt::Result {
    let title = format!("Actual vs forecast (α = {})", r.request.alpha);
    write!(f, "{}", subheading(&title))?;
    write!(f, "{}", chart(&r.chart(), CHART_HEIGHT))
}

fn write_modeling(f: &mut fmt::Formatter<'_>, r: &ModelingReport) -> fmt::Result {
    write!(f, "{}", heading("Modeling"))?;
    write_parameters(f, r)?;

    write!(f, "{}", subheading("Double exponential smoothing"))?;
    writeln!(f, "  S'[t]  = α Y[t] + (1 - α) S'[t-1]")?;
    writeln!(f, "  S''[t] = α S'[t] + (1 - α) S''[t-1]")?;
    writeln!(f, "  a[t]   = 2 S'[t] - S''[t]")?;
    writeln!(f, "  b[t]   = α / (1 - α) (S'[t] - S''[t])")?;
    writeln!(f, "  F[t+m] = a[t] + b[t] m")?;

    write!(f, "{}", subheading("Calculation table"))?;
    let mut table = Table::new(["Year", "Actual", "S'", "S''", "a", "b", "Forecast"]);
    for row in r.smoothing.rows() {
        table.row([
            row.period.to_string(),
            num(row.actual, 4),
            num(row.s1, 4),
            num(row.s2, 4),
            num(row.level, 4),
            num(row.trend, 4),
            opt_num(row.forecast, 4),
        ]);
    }
    write!(f, "{}", table)?;

    let title = format!("Forecast for the next {} years", r.request.horizon);
    write!(f, "{}", subheading(&title))?;
    let mut future = Table::new(["Year", "Forecast"]);
    for p in &r.forecast.out_of_sample {
        future.row([p.period.to_string(), num(p.value, 4)]);
    }
    write!(f, "{}", future)?;

    write_chart(f, r)
}

fn write_evaluation(f: &mut fmt::Formatter<'_>, r: &EvaluationReport) -> fmt::Result {
    let eval = &r.evaluation;
    write!(f, "{}", heading("Evaluation"))?;
    write_parameters(f, &r.modeling)?;

    write!(f, "{}", subheading("Accuracy"))?;
    let mape = match (eval.mape, eval.band) {
        (Some(mape), Some(band)) => format!("{} {:.2}% ({})", band.marker(), mape, band),
        _ => "not computable (every actual is zero)".to_string(),
    };
    let mut metrics = Table::new(["Metric", "Value", "Description"]);
    metrics
        .row(["MAE".to_string(), num(eval.mae, 4), "Mean Absolute Error".to_string()])
        .row(["MSE".to_string(), num(eval.mse, 4), "Mean Squared Error".to_string()])
        .row(["RMSE".to_string(), num(eval.rmse, 4), "Root Mean Squared Error".to_string()])
        .row(["MAPE".to_string(), mape, "Mean Absolute Percentage Error".to_string()]);
    write!(f, "{}", metrics)?;
    writeln!(
        f,
        "  MAE, MSE and RMSE cover {} periods; MAPE covers {} periods with a non-zero actual.",
        eval.n_evaluated, eval.n_mape
    )?;

    write!(f, "{}", subheading("Errors per period"))?;
    let mut errors = Table::new(["Year", "Actual", "Forecast", "Error", "|Error|", "Error²"]);
    for row in &eval.rows {
        errors.row([
            row.period.to_string(),
            num(row.actual, 4),
            num(row.forecast, 4),
            num(row.error, 4),
            num(row.abs_error, 4),
            num(row.squared_error, 6),
        ]);
    }
    write!(f, "{}", errors)?;

    write_chart(f, &r.modeling)?;

    write!(f, "{}", subheading("Conclusion"))?;
    writeln!(f, "  {}", r.conclusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelArgs;

    const CSV: &str = "\
Year,gini_disp,gini_mkt,Country
2000,0.60,0.68,ZA
2001,0.62,0.69,ZA
2002,,0.69,ZA
2003,0.63,0.70,ZA
2004,0.65,0.72,ZA
2005,0.64,0.72,ZA
2006,0.66,0.73,ZA
2007,0.67,0.74,ZA
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), "gini_disp").unwrap()
    }

    #[test]
    fn test_business_page() {
        let report = build(&Page::Business, &dataset(), "gini_disp").unwrap();
        let text = report.to_string();
        assert!(text.contains("Business Understanding"));
        assert!(text.contains("Data points: 8"));
        assert!(text.contains("2000-2007"));
        assert!(text.contains("6. Deployment"));
    }

    #[test]
    fn test_understanding_page() {
        let report = build(&Page::Understanding, &dataset(), "gini_disp").unwrap();
        let text = report.to_string();
        assert!(text.contains("Descriptive statistics"));
        assert!(text.contains("needs interpolation"));
        assert!(text.contains("Country"));
    }

    #[test]
    fn test_understanding_page_reports_target_mean() {
        let report = build(&Page::Understanding, &dataset(), "gini_disp").unwrap();
        // Mean of the seven present values, 4.47 / 7.
        assert!(report.to_string().contains("0.6386"));
    }

    #[test]
    fn test_preparation_page_shows_filled_gap() {
        let report = build(&Page::Preparation, &dataset(), "gini_disp").unwrap();
        let text = report.to_string();
        assert!(text.contains("Before vs after interpolation"));
        assert!(text.contains("gini_disp before"));
        // gini_mkt has no gaps, so it is left out of the comparison.
        assert!(!text.contains("gini_mkt before"));
        let row = text
            .lines()
            .find(|line| line.trim_start().starts_with("2002") && line.contains('*'))
            .unwrap();
        assert!(row.contains("0.6250*"));
        assert!(row.contains(" - "));
    }

    #[test]
    fn test_modeling_page() {
        let page = Page::Modeling(ModelArgs {
            alpha: 0.5,
            horizon: 3,
        });
        let report = build(&page, &dataset(), "gini_disp").unwrap();
        let text = report.to_string();
        assert!(text.contains("Calculation table"));
        assert!(text.contains("2010"));
        assert!(text.contains("cutoff (2007)"));
    }

    #[test]
    fn test_evaluation_page() {
        let page = Page::Evaluation(ModelArgs {
            alpha: 0.6,
            horizon: 5,
        });
        let report = build(&page, &dataset(), "gini_disp").unwrap();
        let text = report.to_string();
        assert!(text.contains("MAPE"));
        assert!(text.contains("Conclusion"));
        assert!(text.contains("2012"));
    }

    #[test]
    fn test_invalid_alpha_is_rejected_before_computation() {
        let page = Page::Evaluation(ModelArgs {
            alpha: 1.5,
            horizon: 5,
        });
        let err = build(&page, &dataset(), "gini_disp").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_json_is_tagged_by_page() {
        let page = Page::Modeling(ModelArgs {
            alpha: 0.6,
            horizon: 2,
        });
        let report = build(&page, &dataset(), "gini_disp").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["page"], "modeling");
        assert_eq!(json["report"]["forecast"]["out_of_sample"].as_array().unwrap().len(), 2);
    }
}
