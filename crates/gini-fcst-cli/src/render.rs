//! Plain-text tables and the forecast chart.

use std::fmt;

use gini_fcst_core::{ChartData, ForecastPoint};

/// Format a float with fixed decimals; NaN and infinities print as `n/a`.
pub fn num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        "n/a".to_string()
    }
}

/// Same as [`num`] for optional values.
pub fn opt_num(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| num(v, decimals))
}

/// Column-aligned text table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

fn write_cells(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    writeln!(f, "  {}", line.join("  ").trim_end())
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        write_cells(f, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "  {}", rule.join("  "))?;
        for row in &self.rows {
            write_cells(f, row, &widths)?;
        }
        Ok(())
    }
}

/// Page or section heading.
pub fn heading(title: &str) -> String {
    format!("\n{}\n{}\n", title, "=".repeat(title.chars().count()))
}

pub fn subheading(title: &str) -> String {
    format!("\n{}\n{}\n", title, "-".repeat(title.chars().count()))
}

const ACTUAL: char = '*';
const IN_SAMPLE: char = 'o';
const FUTURE: char = '+';
const CUTOFF: char = ':';
/// Widest period range the chart draws, one column per period.
const MAX_CHART_WIDTH: usize = 200;

/// Text chart of actual values, in-sample forecasts and future forecasts,
/// one column per period. When future values are present a dotted line
/// marks the cutoff period.
pub fn chart(data: &ChartData, height: usize) -> String {
    let points = || {
        data.actual
            .iter()
            .chain(&data.in_sample)
            .chain(&data.future)
            .filter(|p| p.value.is_finite())
    };
    let (Some(first), Some(last)) = (
        points().map(|p| p.period).min(),
        points().map(|p| p.period).max(),
    ) else {
        return "  (no data to plot)\n".to_string();
    };
    let lo = points().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let hi = points().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let height = height.max(2);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let column = |period: i32| (i64::from(period) - i64::from(first)) as usize;
    let width = column(last) + 1;
    if width > MAX_CHART_WIDTH {
        return format!(
            "  (periods {}..{} span more than {} columns, not plotted)\n",
            first, last, MAX_CHART_WIDTH
        );
    }
    let mut grid = vec![vec![' '; width]; height];
    let row_of = |value: f64| {
        let scaled = ((hi - value) / span * (height - 1) as f64).round();
        (scaled.max(0.0) as usize).min(height - 1)
    };

    if !data.future.is_empty() && (first..=last).contains(&data.cutoff) {
        let cutoff_col = column(data.cutoff);
        for row in grid.iter_mut() {
            row[cutoff_col] = CUTOFF;
        }
    }

    // Later layers overwrite earlier ones; actual values stay on top.
    let mut plot = |series: &[ForecastPoint], marker: char| {
        for p in series.iter().filter(|p| p.value.is_finite()) {
            grid[row_of(p.value)][column(p.period)] = marker;
        }
    };
    plot(&data.future, FUTURE);
    plot(&data.in_sample, IN_SAMPLE);
    plot(&data.actual, ACTUAL);

    let label_width = 8;
    let mut out = String::new();
    for (i, row) in grid.iter().enumerate() {
        let label = if i == 0 {
            num(hi, 4)
        } else if i == height - 1 {
            num(lo, 4)
        } else {
            String::new()
        };
        let line: String = row.iter().collect();
        out.push_str(&format!("  {:>label_width$} |{}\n", label, line.trim_end()));
    }
    out.push_str(&format!("  {:>label_width$} +{}\n", "", "-".repeat(width)));
    let first_label = first.to_string();
    let last_label = last.to_string();
    let axis = if width > first_label.len() + last_label.len() {
        let gap = width - first_label.len() - last_label.len();
        format!("{}{}{}", first_label, " ".repeat(gap), last_label)
    } else {
        first_label
    };
    out.push_str(&format!("  {:>label_width$}  {}\n", "", axis));
    let mut legend = vec![format!("{} actual", ACTUAL)];
    if !data.in_sample.is_empty() {
        legend.push(format!("{} in-sample forecast", IN_SAMPLE));
    }
    if !data.future.is_empty() {
        legend.push(format!("{} future forecast", FUTURE));
        legend.push(format!("{} cutoff ({})", CUTOFF, data.cutoff));
    }
    out.push_str(&format!("  {}\n", legend.join("   ")));
    out
}
