//! Core-vs-FFI parity integration tests.
//!
//! Each test loads the same CSV through `gini_dataset_load` and through
//! `Dataset::from_path`, runs the FFI entry point and the core pipeline with
//! identical α and horizon, and requires bit-identical numbers.

use std::ffi::{c_char, c_double, c_int, CString};
use std::path::PathBuf;

use approx::assert_relative_eq;
use gini_fcst_core::{prepare, run_evaluation, run_modeling, Dataset, ModelRequest};
use gini_fcst_ffi::types::{
    ErrorCode, GiniAccuracyBand, GiniDataset, GiniError, GiniEvaluationResult,
    GiniFilledValuesResult, GiniForecastResult, GiniTrend,
};

// Defined in gini_fcst_ffi/src/lib.rs
extern "C" {
    fn gini_dataset_load(
        path: *const c_char,
        target: *const c_char,
        out_error: *mut GiniError,
    ) -> *mut GiniDataset;
    fn gini_dataset_share(dataset: *const GiniDataset) -> *mut GiniDataset;
    fn gini_dataset_length(dataset: *const GiniDataset) -> usize;
    fn gini_dataset_free(dataset: *mut GiniDataset);
    fn gini_des_forecast(
        dataset: *const GiniDataset,
        alpha: c_double,
        horizon: c_int,
        out_result: *mut GiniForecastResult,
        out_error: *mut GiniError,
    ) -> bool;
    fn gini_des_evaluate(
        dataset: *const GiniDataset,
        alpha: c_double,
        horizon: c_int,
        out_result: *mut GiniEvaluationResult,
        out_error: *mut GiniError,
    ) -> bool;
    fn gini_interpolate(
        periods: *const c_int,
        values: *const c_double,
        validity: *const u64,
        length: usize,
        out_result: *mut GiniFilledValuesResult,
        out_error: *mut GiniError,
    ) -> bool;
    fn gini_free_forecast_result(result: *mut GiniForecastResult);
    fn gini_free_evaluation_result(result: *mut GiniEvaluationResult);
    fn gini_free_filled_values_result(result: *mut GiniFilledValuesResult);
}

// ── Fixtures ───────────────────────────────────────────────────────────

const CSV: &str = "\
Year,gini_disp,gini_mkt,Country
1995,0.58,0.66,South Africa
1996,,0.67,South Africa
1997,0.60,0.67,South Africa
1998,0.61,0.68,South Africa
1999,0.61,0.68,South Africa
2000,0.63,0.69,South Africa
2001,0.62,0.70,South Africa
2002,0.64,0.70,South Africa
2003,0.63,0.71,South Africa
2004,0.65,0.72,South Africa
";

struct TempCsv(PathBuf);

impl TempCsv {
    fn new(name: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "gini_fcst_ffi_{}_{}.csv",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        Self(path)
    }

    fn c_path(&self) -> CString {
        CString::new(self.0.to_str().unwrap()).unwrap()
    }
}

impl Drop for TempCsv {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn load(csv: &TempCsv, target: Option<&str>) -> *mut GiniDataset {
    let path = csv.c_path();
    let target = target.map(|t| CString::new(t).unwrap());
    let mut error = GiniError::default();
    let handle = unsafe {
        gini_dataset_load(
            path.as_ptr(),
            target.as_ref().map_or(std::ptr::null(), |t| t.as_ptr()),
            &mut error,
        )
    };
    assert!(!handle.is_null(), "load failed: {}", error.message());
    handle
}

fn assert_bits(label: &str, core: f64, ffi: f64) {
    if core.is_nan() && ffi.is_nan() {
        return;
    }
    assert_eq!(core.to_bits(), ffi.to_bits(), "{label}: core={core} ffi={ffi}");
}

// ── Parity ─────────────────────────────────────────────────────────────

#[test]
fn test_forecast_parity() {
    let csv = TempCsv::new("forecast", CSV);
    let handle = load(&csv, None);
    let dataset = Dataset::from_path(&csv.0, "gini_disp").unwrap();

    for &(alpha, horizon) in &[(0.6, 5), (0.3, 1), (0.95, 20)] {
        let request = ModelRequest::new(alpha, horizon).unwrap();
        let core = run_modeling(&dataset, "gini_disp", &request).unwrap();

        let mut result = GiniForecastResult::default();
        let mut error = GiniError::default();
        let ok = unsafe {
            gini_des_forecast(handle, alpha, horizon as c_int, &mut result, &mut error)
        };
        assert!(ok, "forecast failed: {}", error.message());
        assert_eq!(error.code, ErrorCode::Success);

        let rows = unsafe { std::slice::from_raw_parts(result.rows, result.n_rows) };
        let core_rows = core.smoothing.rows();
        assert_eq!(rows.len(), core_rows.len());
        for (row, expected) in rows.iter().zip(&core_rows) {
            assert_eq!(row.period, expected.period);
            assert_bits("s1", expected.s1, row.s1);
            assert_bits("s2", expected.s2, row.s2);
            assert_bits("level", expected.level, row.level);
            assert_bits("trend", expected.trend, row.trend);
            assert_eq!(row.has_forecast, expected.forecast.is_some());
            assert_bits(
                "forecast",
                expected.forecast.unwrap_or(f64::NAN),
                row.forecast,
            );
        }
        assert!(!rows[0].has_forecast);

        let future = unsafe { std::slice::from_raw_parts(result.future, result.n_future) };
        assert_eq!(future.len(), horizon);
        for (point, expected) in future.iter().zip(&core.forecast.out_of_sample) {
            assert_eq!(point.period, expected.period);
            assert_bits("future", expected.value, point.value);
        }
        assert_eq!(result.trend, GiniTrend::from(core.forecast.trend));
        assert_eq!(result.n_dropped, core.n_dropped);
        assert_bits("alpha", alpha, result.alpha);

        unsafe { gini_free_forecast_result(&mut result) };
        assert!(result.rows.is_null());
        assert!(result.future.is_null());
    }

    unsafe { gini_dataset_free(handle) };
}

#[test]
fn test_evaluation_parity() {
    let csv = TempCsv::new("evaluate", CSV);
    let handle = load(&csv, Some("gini_disp"));
    let dataset = Dataset::from_path(&csv.0, "gini_disp").unwrap();

    let request = ModelRequest::new(0.5, 3).unwrap();
    let core = run_evaluation(&dataset, "gini_disp", &request).unwrap();

    let mut result = GiniEvaluationResult::default();
    let mut error = GiniError::default();
    let ok = unsafe { gini_des_evaluate(handle, 0.5, 3, &mut result, &mut error) };
    assert!(ok, "evaluate failed: {}", error.message());

    let eval = &core.evaluation;
    assert_relative_eq!(result.rmse, result.mse.sqrt(), epsilon = 1e-15);
    assert_bits("mae", eval.mae, result.mae);
    assert_bits("mse", eval.mse, result.mse);
    assert_bits("rmse", eval.rmse, result.rmse);
    assert!(result.mape_computable);
    assert_bits("mape", eval.mape.unwrap(), result.mape);
    assert_eq!(result.n_evaluated, eval.n_evaluated);
    assert_eq!(result.n_mape, eval.n_mape);
    assert_eq!(result.band, GiniAccuracyBand::from(eval.band));

    let errors = unsafe { std::slice::from_raw_parts(result.errors, result.n_errors) };
    assert_eq!(errors.len(), eval.rows.len());
    for (row, expected) in errors.iter().zip(&eval.rows) {
        assert_eq!(row.period, expected.period);
        assert_bits("error", expected.error, row.error);
        assert_bits("squared_error", expected.squared_error, row.squared_error);
    }

    unsafe {
        gini_free_evaluation_result(&mut result);
        gini_dataset_free(handle);
    }
    assert!(result.errors.is_null());
}

#[test]
fn test_interpolate_parity() {
    let csv = TempCsv::new("interpolate", CSV);
    let dataset = Dataset::from_path(&csv.0, "gini_disp").unwrap();
    let core = prepare(&dataset, "gini_disp").unwrap();
    let target = &core.interpolation[0];
    assert_eq!(target.column, "gini_disp");

    let periods: Vec<c_int> = target.values.iter().map(|v| v.year).collect();
    let values: Vec<f64> = target.values.iter().map(|v| v.raw.unwrap_or(0.0)).collect();
    let mut validity = 0u64;
    for (i, v) in target.values.iter().enumerate() {
        if v.raw.is_some() {
            validity |= 1 << i;
        }
    }

    let mut result = GiniFilledValuesResult::default();
    let mut error = GiniError::default();
    let ok = unsafe {
        gini_interpolate(
            periods.as_ptr(),
            values.as_ptr(),
            &validity,
            periods.len(),
            &mut result,
            &mut error,
        )
    };
    assert!(ok, "interpolate failed: {}", error.message());
    assert_eq!(result.length, periods.len());

    let filled = unsafe { std::slice::from_raw_parts(result.values, result.length) };
    let bits = unsafe { *result.validity };
    for (i, (value, expected)) in filled.iter().zip(&target.values).enumerate() {
        assert_eq!((bits >> i) & 1 == 1, expected.filled.is_some());
        if let Some(expected) = expected.filled {
            assert_bits("filled", expected, *value);
        }
    }
    // 1996 sits halfway between 0.58 and 0.60.
    assert!(target.values[1].was_filled());
    assert_relative_eq!(filled[1], 0.59, epsilon = 1e-12);

    unsafe { gini_free_filled_values_result(&mut result) };
    assert!(result.values.is_null());
}

#[test]
fn test_shared_handle_outlives_first() {
    let csv = TempCsv::new("share", CSV);
    let first = load(&csv, None);
    let second = unsafe { gini_dataset_share(first) };
    assert!(!second.is_null());
    assert_eq!(unsafe { gini_dataset_length(second) }, 10);

    // Releasing the first handle leaves the shared one usable.
    unsafe { gini_dataset_free(first) };

    let mut result = GiniForecastResult::default();
    let mut error = GiniError::default();
    let ok = unsafe { gini_des_forecast(second, 0.6, 5, &mut result, &mut error) };
    assert!(ok, "forecast failed: {}", error.message());
    assert_eq!(result.n_future, 5);

    unsafe {
        gini_free_forecast_result(&mut result);
        gini_dataset_free(second);
    }
}

// ── Error paths ────────────────────────────────────────────────────────

#[test]
fn test_invalid_alpha_rejected() {
    let csv = TempCsv::new("alpha", CSV);
    let handle = load(&csv, None);

    for alpha in [0.0, 1.0, -0.2, f64::NAN] {
        let mut result = GiniForecastResult::default();
        let mut error = GiniError::default();
        let ok = unsafe { gini_des_forecast(handle, alpha, 5, &mut result, &mut error) };
        assert!(!ok);
        assert_eq!(error.code, ErrorCode::InvalidParameter, "alpha={alpha}");
        assert!(result.rows.is_null());
    }

    unsafe { gini_dataset_free(handle) };
}

#[test]
fn test_invalid_horizon_rejected() {
    let csv = TempCsv::new("horizon", CSV);
    let handle = load(&csv, None);

    for horizon in [0, -3, 21] {
        let mut result = GiniEvaluationResult::default();
        let mut error = GiniError::default();
        let ok = unsafe { gini_des_evaluate(handle, 0.6, horizon, &mut result, &mut error) };
        assert!(!ok);
        assert_eq!(error.code, ErrorCode::InvalidParameter, "horizon={horizon}");
    }

    unsafe { gini_dataset_free(handle) };
}

#[test]
fn test_missing_target_column() {
    let csv = TempCsv::new("missing", CSV);
    let path = csv.c_path();
    let target = CString::new("palma_ratio").unwrap();
    let mut error = GiniError::default();
    let handle = unsafe { gini_dataset_load(path.as_ptr(), target.as_ptr(), &mut error) };
    assert!(handle.is_null());
    assert_eq!(error.code, ErrorCode::MissingColumn);
    assert!(error.message().contains("palma_ratio"));
}

#[test]
fn test_insufficient_data() {
    let csv = TempCsv::new("short", "Year,gini_disp\n2000,0.6\n2001,\n");
    let handle = load(&csv, None);

    let mut result = GiniForecastResult::default();
    let mut error = GiniError::default();
    let ok = unsafe { gini_des_forecast(handle, 0.6, 5, &mut result, &mut error) };
    assert!(!ok);
    assert_eq!(error.code, ErrorCode::InsufficientData);

    unsafe { gini_dataset_free(handle) };
}
