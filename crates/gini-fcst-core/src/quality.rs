//! Data quality assessment: IQR outliers and the quality summary table.

use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::stats::percentile;

/// Multiplier applied to the IQR to obtain the whisker bounds.
pub const IQR_FENCE: f64 = 1.5;

/// IQR outlier bounds and the values falling outside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// First quartile
    pub q1: f64,
    /// Third quartile
    pub q3: f64,
    /// Interquartile range (q3 - q1)
    pub iqr: f64,
    /// q1 - 1.5 * iqr
    pub lower: f64,
    /// q3 + 1.5 * iqr
    pub upper: f64,
    /// Positions in the input slice of values outside [lower, upper]
    pub outlier_indices: Vec<usize>,
}

impl OutlierReport {
    pub fn count(&self) -> usize {
        self.outlier_indices.len()
    }

    /// Outlying values, in input order.
    pub fn values(&self, input: &[f64]) -> Vec<f64> {
        self.outlier_indices.iter().map(|&i| input[i]).collect()
    }
}

/// Flag values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
///
/// Quartiles use linear interpolation between order statistics. Non-finite
/// values are ignored. Empty input reports zero outliers with NaN bounds.
pub fn iqr_outliers(values: &[f64]) -> OutlierReport {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    // NaN bounds compare false, so empty input flags nothing
    let outlier_indices = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite() && (**v < lower || **v > upper))
        .map(|(i, _)| i)
        .collect();

    OutlierReport {
        q1,
        q3,
        iqr,
        lower,
        upper,
        outlier_indices,
    }
}

/// Outcome of a single quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Ok,
    NeedsAttention,
}

impl QualityStatus {
    fn from_count(count: usize) -> Self {
        if count > 0 {
            QualityStatus::NeedsAttention
        } else {
            QualityStatus::Ok
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            QualityStatus::Ok => "✅",
            QualityStatus::NeedsAttention => "⚠️",
        }
    }
}

/// One row of the quality summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityCheck {
    pub aspect: &'static str,
    pub count: usize,
    pub status: QualityStatus,
    /// Remedy suggested when the check fails
    pub action: &'static str,
}

impl QualityCheck {
    fn new(aspect: &'static str, count: usize, action: &'static str) -> Self {
        Self {
            aspect,
            count,
            status: QualityStatus::from_count(count),
            action,
        }
    }

    /// Status text shown in the table.
    pub fn status_text(&self) -> String {
        match self.status {
            QualityStatus::Ok => format!("{} ok", self.status.marker()),
            QualityStatus::NeedsAttention => format!("{} {}", self.status.marker(), self.action),
        }
    }
}

/// Quality summary of the (Year, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub target: String,
    pub missing: QualityCheck,
    pub duplicates: QualityCheck,
    pub outliers: QualityCheck,
    pub outlier_report: OutlierReport,
}

impl QualitySummary {
    /// Count missing target values, duplicate (Year, target) rows and IQR
    /// outliers of the target.
    pub fn compute(dataset: &Dataset, target: &str) -> Result<Self> {
        let column = dataset.numeric(target)?;

        let missing = column.iter().filter(|v| v.is_none()).count();

        let mut seen = HashSet::with_capacity(column.len());
        let duplicates = dataset
            .years()
            .iter()
            .zip(column)
            .filter(|(year, value)| !seen.insert((**year, value.map(f64::to_bits))))
            .count();

        let present: Vec<f64> = column.iter().filter_map(|v| *v).collect();
        let outlier_report = iqr_outliers(&present);

        tracing::debug!(
            target,
            missing,
            duplicates,
            outliers = outlier_report.count(),
            "quality summary computed"
        );

        Ok(Self {
            target: target.to_string(),
            missing: QualityCheck::new("Missing values", missing, "needs interpolation"),
            duplicates: QualityCheck::new("Duplicate rows", duplicates, "needs deduplication"),
            outliers: QualityCheck::new(
                "Outliers (IQR method)",
                outlier_report.count(),
                "needs investigation",
            ),
            outlier_report,
        })
    }

    /// The three checks in display order.
    pub fn checks(&self) -> [&QualityCheck; 3] {
        [&self.missing, &self.duplicates, &self.outliers]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_iqr_bounds() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let report = iqr_outliers(&values);
        assert_relative_eq!(report.q1, 3.0);
        assert_relative_eq!(report.q3, 7.0);
        assert_relative_eq!(report.iqr, 4.0);
        assert_relative_eq!(report.lower, -3.0);
        assert_relative_eq!(report.upper, 13.0);
        assert_eq!(report.outlier_indices, vec![8]);
        assert_eq!(report.values(&values), vec![100.0]);
    }

    #[test]
    fn test_iqr_both_tails() {
        let values = [-50.0, 10.0, 11.0, 12.0, 13.0, 14.0, 60.0];
        let report = iqr_outliers(&values);
        assert_eq!(report.outlier_indices, vec![0, 6]);
    }

    #[test]
    fn test_iqr_empty_input() {
        let report = iqr_outliers(&[]);
        assert_eq!(report.count(), 0);
        assert!(report.q1.is_nan());
    }

    #[test]
    fn test_iqr_constant_series() {
        let report = iqr_outliers(&[0.6; 6]);
        assert_eq!(report.iqr, 0.0);
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn test_quality_summary() {
        let csv = "Year,gini_disp\n2000,0.60\n2001,\n2002,0.61\n2002,0.61\n2003,0.62\n2004,0.63\n2005,0.95\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "gini_disp").unwrap();
        let summary = QualitySummary::compute(&ds, "gini_disp").unwrap();

        assert_eq!(summary.missing.count, 1);
        assert_eq!(summary.missing.status, QualityStatus::NeedsAttention);
        assert_eq!(summary.duplicates.count, 1);
        assert_eq!(summary.outliers.count, 1);
        assert!(summary.outliers.status_text().contains("needs investigation"));
    }

    #[test]
    fn test_quality_summary_clean() {
        let csv = "Year,gini_disp\n2000,0.60\n2001,0.61\n2002,0.62\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "gini_disp").unwrap();
        let summary = QualitySummary::compute(&ds, "gini_disp").unwrap();
        assert!(summary.checks().iter().all(|c| c.status == QualityStatus::Ok));
        assert!(QualitySummary::compute(&ds, "GDP").is_err());
    }
}
