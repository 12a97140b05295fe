//! Annual indicator dataset.
//!
//! The dataset is a table keyed by `Year` with one target column (the
//! disposable-income Gini coefficient by default) and any number of
//! additional economic indicators. It is loaded once and shared read-only,
//! typically behind an `Arc`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::preprocess::Observation;

/// Name of the period column.
pub const YEAR_COLUMN: &str = "Year";

/// Default target column.
pub const DEFAULT_TARGET: &str = "gini_disp";

/// Indicator columns kept by [`Dataset::select_columns`] when present.
pub const OPTIONAL_INDICATORS: [&str; 8] = [
    "gini_mkt",
    "Inflation rate",
    "GDP",
    "GOVEDU",
    "GOVEXP",
    "FINDEV 1",
    "DEMOCRACY",
    "FLABOUR",
];

const MISSING_TOKENS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "-"];

/// A single data column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric column; `None` marks a missing cell.
    Numeric(Vec<Option<f64>>),
    /// Column with at least one non-numeric cell.
    Text(Vec<Option<String>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v[row].is_none(),
            Column::Text(v) => v[row].is_none(),
        }
    }

    fn cell_key(&self, row: usize) -> String {
        match self {
            Column::Numeric(v) => v[row].map_or_else(|| "\u{0}".to_string(), |x| x.to_bits().to_string()),
            Column::Text(v) => v[row].clone().unwrap_or_else(|| "\u{0}".to_string()),
        }
    }
}

/// Column kind, as shown in the "data types" overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// Name and kind of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Missing-value count for a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub count: usize,
    /// Percentage of rows, rounded to two decimals
    pub percent: f64,
}

/// Immutable annual dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    years: Vec<i32>,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from already parsed columns.
    ///
    /// Every column must have one cell per year.
    pub fn new(years: Vec<i32>, columns: Vec<(String, Column)>) -> Result<Self> {
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        for (name, column) in columns {
            if column.len() != years.len() {
                return Err(ForecastError::Dataset(format!(
                    "Column '{}' has {} rows but '{}' has {}",
                    name,
                    column.len(),
                    YEAR_COLUMN,
                    years.len()
                )));
            }
            if name == YEAR_COLUMN || names.contains(&name) {
                return Err(ForecastError::Dataset(format!("Duplicate column '{}'", name)));
            }
            names.push(name);
            cols.push(column);
        }
        Ok(Self {
            years,
            names,
            columns: cols,
        })
    }

    /// Load a CSV file with a header row.
    ///
    /// The file must contain a `Year` column and `target`; a missing file or
    /// schema problem is reported as an error and is fatal for the caller.
    pub fn from_path(path: impl AsRef<Path>, target: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ForecastError::Dataset(format!("Cannot open '{}': {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(BufReader::new(file), target)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.names.len() + 1,
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV content from any reader.
    pub fn from_reader<R: Read>(reader: R, target: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?.clone();
        let year_idx = headers
            .iter()
            .position(|h| h == YEAR_COLUMN)
            .ok_or_else(|| ForecastError::MissingColumn(YEAR_COLUMN.to_string()))?;
        if !headers.iter().any(|h| h == target) {
            return Err(ForecastError::MissingColumn(target.to_string()));
        }

        let mut years = Vec::new();
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let year_field = record.get(year_idx).unwrap_or("");
            years.push(parse_year(year_field).ok_or_else(|| {
                ForecastError::Dataset(format!(
                    "Row {}: '{}' is not a valid {}",
                    row + 1,
                    year_field,
                    YEAR_COLUMN
                ))
            })?);

            for (i, cells) in raw.iter_mut().enumerate() {
                let field = record.get(i).unwrap_or("");
                cells.push(if MISSING_TOKENS.contains(&field) {
                    None
                } else {
                    Some(field.to_string())
                });
            }
        }

        let mut columns = Vec::with_capacity(headers.len() - 1);
        for (i, (name, cells)) in headers.iter().zip(raw).enumerate() {
            if i == year_idx {
                continue;
            }
            columns.push((name.to_string(), classify(cells)));
        }

        let dataset = Self::new(years, columns)?;
        if !matches!(dataset.column(target), Some(Column::Numeric(_))) {
            return Err(ForecastError::Dataset(format!(
                "Target column '{}' is not numeric",
                target
            )));
        }
        Ok(dataset)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Year of every row, in file order.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// First and last year, if any rows exist.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.years.iter().min()?;
        let max = self.years.iter().max()?;
        Some((*min, *max))
    }

    /// Names of all columns except `Year`, in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Values of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(Column::Text(_)) => Err(ForecastError::InvalidInput(format!(
                "Column '{}' is not numeric",
                name
            ))),
            None => Err(ForecastError::MissingColumn(name.to_string())),
        }
    }

    /// Names of the numeric indicator columns (excluding `Year`).
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| matches!(c, Column::Numeric(_)))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// (year, value) observations of a numeric column, in file order.
    pub fn observations(&self, name: &str) -> Result<Vec<Observation>> {
        let values = self.numeric(name)?;
        Ok(self
            .years
            .iter()
            .zip(values)
            .map(|(&period, &value)| Observation::new(period, value))
            .collect())
    }

    /// Kind of every column, `Year` first.
    pub fn column_types(&self) -> Vec<ColumnInfo> {
        let mut info = vec![ColumnInfo {
            name: YEAR_COLUMN.to_string(),
            kind: ColumnKind::Integer,
        }];
        for (name, column) in self.names.iter().zip(&self.columns) {
            let kind = match column {
                Column::Numeric(values) if values.iter().flatten().all(|v| v.fract() == 0.0) => {
                    ColumnKind::Integer
                }
                Column::Numeric(_) => ColumnKind::Float,
                Column::Text(_) => ColumnKind::Text,
            };
            info.push(ColumnInfo {
                name: name.clone(),
                kind,
            });
        }
        info
    }

    /// Missing cells per column (excluding `Year`, which is never missing).
    pub fn missing_counts(&self) -> Vec<MissingCount> {
        let n = self.len().max(1) as f64;
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| {
                let count = (0..self.len()).filter(|&r| column.is_missing(r)).count();
                MissingCount {
                    column: name.clone(),
                    count,
                    percent: (count as f64 / n * 10_000.0).round() / 100.0,
                }
            })
            .collect()
    }

    /// Total number of missing cells.
    pub fn total_missing(&self) -> usize {
        self.missing_counts().iter().map(|m| m.count).sum()
    }

    /// Number of rows identical (in every column) to an earlier row.
    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.len());
        (0..self.len())
            .filter(|&row| {
                let key: Vec<String> = std::iter::once(self.years[row].to_string())
                    .chain(self.columns.iter().map(|c| c.cell_key(row)))
                    .collect();
                !seen.insert(key)
            })
            .count()
    }

    /// Keep `Year`, the target and whichever optional indicators exist.
    pub fn select_columns(&self, target: &str) -> Result<Dataset> {
        let mut keep = vec![target];
        keep.extend(
            OPTIONAL_INDICATORS
                .iter()
                .copied()
                .filter(|c| *c != target && self.column(c).is_some()),
        );

        let mut columns = Vec::with_capacity(keep.len());
        for name in keep {
            let column = self
                .column(name)
                .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))?;
            columns.push((name.to_string(), column.clone()));
        }
        Dataset::new(self.years.clone(), columns)
    }

    /// Copy of this dataset with every numeric column transformed by `f`.
    ///
    /// `f` receives the years and the column values in file order and must
    /// return one value per row.
    pub(crate) fn map_numeric<F>(&self, mut f: F) -> Result<Dataset>
    where
        F: FnMut(&[i32], &[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self
            .names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| {
                let mapped = match column {
                    Column::Numeric(values) => Column::Numeric(f(&self.years, values)),
                    Column::Text(values) => Column::Text(values.clone()),
                };
                (name.clone(), mapped)
            })
            .collect();
        Dataset::new(self.years.clone(), columns)
    }

    /// Copy of this dataset with rows reordered by ascending year (stable).
    pub fn sorted_by_year(&self) -> Dataset {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.years[i]);

        let columns = self
            .columns
            .iter()
            .map(|column| match column {
                Column::Numeric(v) => Column::Numeric(order.iter().map(|&i| v[i]).collect()),
                Column::Text(v) => Column::Text(order.iter().map(|&i| v[i].clone()).collect()),
            })
            .collect();

        Dataset {
            years: order.iter().map(|&i| self.years[i]).collect(),
            names: self.names.clone(),
            columns,
        }
    }
}

/// Human-readable description of a known column.
pub fn column_description(name: &str) -> &str {
    match name {
        "Year" => "Observation year",
        "gini_disp" => "Gini coefficient (disposable income) - target variable",
        "gini_mkt" => "Gini coefficient (market income)",
        "Inflation rate" => "Inflation rate (%)",
        "GDP" => "Gross domestic product",
        "GOVEDU" => "Government education spending",
        "GOVEXP" => "Government expenditure",
        "FINDEV 1" => "Financial development index",
        "DEMOCRACY" => "Democracy index",
        "FLABOUR" => "Labour force participation",
        other => other,
    }
}

fn parse_year(field: &str) -> Option<i32> {
    if let Ok(y) = field.parse::<i32>() {
        return Some(y);
    }
    // Spreadsheet exports often write integer columns as floats ("2004.0").
    let y = field.parse::<f64>().ok()?;
    if y.is_finite() && y.fract() == 0.0 && y.abs() < i32::MAX as f64 {
        Some(y as i32)
    } else {
        None
    }
}

fn classify(cells: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        Some(values) => Column::Numeric(values),
        None => Column::Text(cells),
    }
}
