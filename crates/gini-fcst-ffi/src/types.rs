//! C-compatible type definitions for FFI boundary.
//!
//! Result structs own `malloc`-allocated arrays; release them with the
//! matching `gini_free_*` function.

use std::sync::Arc;

use gini_fcst_core::{AccuracyBand, Dataset, ForecastError, Trend};
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
///
/// Codes 1-7 and 10 match `ForecastError::to_code`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidInput = 2,
    ComputationError = 3,
    DatasetError = 4,
    MissingColumn = 5,
    InsufficientData = 6,
    InvalidParameter = 7,
    AllocationError = 8,
    PanicCaught = 9,
    InternalError = 10,
}

impl From<&ForecastError> for ErrorCode {
    fn from(e: &ForecastError) -> Self {
        match e.to_code() {
            1 => ErrorCode::NullPointer,
            2 => ErrorCode::InvalidInput,
            3 => ErrorCode::ComputationError,
            4 => ErrorCode::DatasetError,
            5 => ErrorCode::MissingColumn,
            6 => ErrorCode::InsufficientData,
            7 => ErrorCode::InvalidParameter,
            _ => ErrorCode::InternalError,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
pub struct GiniError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl GiniError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0; // Null terminator
    }

    /// Message as a Rust string (lossy).
    pub fn message(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for GiniError {
    fn default() -> Self {
        Self::success()
    }
}

/// Opaque handle to a loaded dataset.
///
/// The dataset is immutable; handles created with `gini_dataset_share`
/// point at the same data and may be used from different threads.
pub struct GiniDataset {
    pub(crate) dataset: Arc<Dataset>,
    pub(crate) target: String,
}

/// One row of the smoothing table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiniSmoothingRow {
    pub period: c_int,
    pub actual: c_double,
    pub s1: c_double,
    pub s2: c_double,
    pub level: c_double,
    pub trend: c_double,
    /// One-step-ahead forecast (NaN for the warm-up period)
    pub forecast: c_double,
    pub has_forecast: bool,
}

/// A forecast value for one period.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiniForecastPoint {
    pub period: c_int,
    pub value: c_double,
}

/// Direction of the forecast path.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiniTrend {
    Flat = 0,
    Rising = 1,
    Falling = 2,
}

impl From<Trend> for GiniTrend {
    fn from(t: Trend) -> Self {
        match t {
            Trend::Flat => GiniTrend::Flat,
            Trend::Rising => GiniTrend::Rising,
            Trend::Falling => GiniTrend::Falling,
        }
    }
}

/// Double exponential smoothing result.
#[repr(C)]
pub struct GiniForecastResult {
    /// Smoothing table, one row per observed period
    pub rows: *mut GiniSmoothingRow,
    pub n_rows: size_t,
    /// Future forecasts
    pub future: *mut GiniForecastPoint,
    pub n_future: size_t,
    pub alpha: c_double,
    pub trend: GiniTrend,
    /// Missing observations outside the interpolated range, dropped
    pub n_dropped: size_t,
    /// Repeated periods dropped after the first
    pub n_duplicates: size_t,
}

impl Default for GiniForecastResult {
    fn default() -> Self {
        Self {
            rows: std::ptr::null_mut(),
            n_rows: 0,
            future: std::ptr::null_mut(),
            n_future: 0,
            alpha: f64::NAN,
            trend: GiniTrend::Flat,
            n_dropped: 0,
            n_duplicates: 0,
        }
    }
}

/// Qualitative MAPE band.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiniAccuracyBand {
    NotComputable = 0,
    VeryGood = 1,
    Good = 2,
    Fair = 3,
    NeedsImprovement = 4,
}

impl From<Option<AccuracyBand>> for GiniAccuracyBand {
    fn from(band: Option<AccuracyBand>) -> Self {
        match band {
            None => GiniAccuracyBand::NotComputable,
            Some(AccuracyBand::VeryGood) => GiniAccuracyBand::VeryGood,
            Some(AccuracyBand::Good) => GiniAccuracyBand::Good,
            Some(AccuracyBand::Fair) => GiniAccuracyBand::Fair,
            Some(AccuracyBand::NeedsImprovement) => GiniAccuracyBand::NeedsImprovement,
        }
    }
}

/// Per-period forecast error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiniErrorRow {
    pub period: c_int,
    pub actual: c_double,
    pub forecast: c_double,
    pub error: c_double,
    pub abs_error: c_double,
    pub squared_error: c_double,
}

/// Evaluation metrics.
#[repr(C)]
pub struct GiniEvaluationResult {
    pub mae: c_double,
    pub mse: c_double,
    pub rmse: c_double,
    /// NaN when `mape_computable` is false
    pub mape: c_double,
    pub mape_computable: bool,
    pub n_evaluated: size_t,
    pub n_mape: size_t,
    pub band: GiniAccuracyBand,
    pub errors: *mut GiniErrorRow,
    pub n_errors: size_t,
}

impl Default for GiniEvaluationResult {
    fn default() -> Self {
        Self {
            mae: f64::NAN,
            mse: f64::NAN,
            rmse: f64::NAN,
            mape: f64::NAN,
            mape_computable: false,
            n_evaluated: 0,
            n_mape: 0,
            band: GiniAccuracyBand::NotComputable,
            errors: std::ptr::null_mut(),
            n_errors: 0,
        }
    }
}

/// IQR outlier result.
#[repr(C)]
pub struct GiniOutlierResult {
    pub q1: c_double,
    pub q3: c_double,
    pub iqr: c_double,
    pub lower: c_double,
    pub upper: c_double,
    /// Input positions of the outliers
    pub indices: *mut size_t,
    pub n_outliers: size_t,
}

impl Default for GiniOutlierResult {
    fn default() -> Self {
        Self {
            q1: f64::NAN,
            q3: f64::NAN,
            iqr: f64::NAN,
            lower: f64::NAN,
            upper: f64::NAN,
            indices: std::ptr::null_mut(),
            n_outliers: 0,
        }
    }
}

/// Interpolated values with validity bitmask.
///
/// Bit i of `validity[i / 64]` is set when element i holds a value.
#[repr(C)]
pub struct GiniFilledValuesResult {
    pub values: *mut c_double,
    pub validity: *mut u64,
    pub length: size_t,
}

impl Default for GiniFilledValuesResult {
    fn default() -> Self {
        Self {
            values: std::ptr::null_mut(),
            validity: std::ptr::null_mut(),
            length: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_truncation() {
        let mut error = GiniError::default();
        let long = "x".repeat(400);
        error.set_error(ErrorCode::InvalidInput, &long);
        assert_eq!(error.message[255], 0);
        assert_eq!(error.message().len(), 255);
    }

    #[test]
    fn test_error_code_matches_core() {
        let e = ForecastError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(ErrorCode::from(&e) as i32, e.to_code());
        let e = ForecastError::MissingColumn("gini_disp".into());
        assert_eq!(ErrorCode::from(&e) as i32, e.to_code());
    }

    #[test]
    fn test_band_conversion() {
        assert_eq!(GiniAccuracyBand::from(None), GiniAccuracyBand::NotComputable);
        assert_eq!(
            GiniAccuracyBand::from(Some(AccuracyBand::Fair)),
            GiniAccuracyBand::Fair
        );
    }
}
