//! FFI boundary layer for the gini-fcst engine.
//!
//! This crate provides C-compatible functions that an external dashboard
//! host can call. The host loads the dataset once, shares the handle across
//! sessions, and runs one computation per request with the session's own
//! α and horizon.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod types;

use libc::{c_char, c_double, c_int, c_void, size_t};
use std::ptr;
use std::sync::Arc;

use gini_fcst_core::{
    interpolate_by_period, iqr_outliers, run_evaluation, run_modeling, Dataset, DEFAULT_TARGET,
};

use allocation::{alloc_and_copy_array, alloc_optional_values};
use conversion::{build_series, c_str_required, c_str_to_str, to_model_request};
use error_handling::{check_null_pointers, ffi_try, init_error};
pub use types::*;

// ============================================================================
// Dataset Handle
// ============================================================================

/// Load a CSV dataset.
///
/// `target` may be null, in which case `gini_disp` is used. Returns null on
/// failure with `out_error` describing the problem.
///
/// # Safety
/// `path` must be a valid null-terminated string; `target` must be null or a
/// valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn gini_dataset_load(
    path: *const c_char,
    target: *const c_char,
    out_error: *mut GiniError,
) -> *mut GiniDataset {
    let handle = ffi_try(out_error, || {
        let path = c_str_required(path, "path")?;
        let target = c_str_to_str(target, DEFAULT_TARGET).to_string();
        let dataset = Dataset::from_path(path, &target)?;
        Ok(GiniDataset {
            dataset: Arc::new(dataset),
            target,
        })
    });

    match handle {
        Some(handle) => Box::into_raw(Box::new(handle)),
        None => ptr::null_mut(),
    }
}

/// Create another handle to the same dataset.
///
/// Each handle must be released with `gini_dataset_free`.
///
/// # Safety
/// `dataset` must be null or a handle returned by this library.
#[no_mangle]
pub unsafe extern "C" fn gini_dataset_share(dataset: *const GiniDataset) -> *mut GiniDataset {
    if dataset.is_null() {
        return ptr::null_mut();
    }
    let source = &*dataset;
    Box::into_raw(Box::new(GiniDataset {
        dataset: Arc::clone(&source.dataset),
        target: source.target.clone(),
    }))
}

/// Number of rows in the dataset (0 for a null handle).
///
/// # Safety
/// `dataset` must be null or a handle returned by this library.
#[no_mangle]
pub unsafe extern "C" fn gini_dataset_length(dataset: *const GiniDataset) -> size_t {
    if dataset.is_null() {
        return 0;
    }
    (*dataset).dataset.len()
}

/// Release a dataset handle.
///
/// # Safety
/// `dataset` must be null or a handle returned by this library that has
/// not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn gini_dataset_free(dataset: *mut GiniDataset) {
    if !dataset.is_null() {
        drop(Box::from_raw(dataset));
    }
}

// ============================================================================
// Forecasting Functions
// ============================================================================

/// Fit double exponential smoothing and forecast `horizon` periods ahead.
///
/// # Safety
/// `dataset` must be a valid handle and `out_result` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn gini_des_forecast(
    dataset: *const GiniDataset,
    alpha: c_double,
    horizon: c_int,
    out_result: *mut GiniForecastResult,
    out_error: *mut GiniError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[dataset as *const c_void, out_result as *const c_void],
    ) {
        return false;
    }
    *out_result = GiniForecastResult::default();

    let handle = &*dataset;
    let Some(report) = ffi_try(out_error, || {
        let request = to_model_request(alpha, horizon)?;
        run_modeling(&handle.dataset, &handle.target, &request)
    }) else {
        return false;
    };

    let rows: Vec<GiniSmoothingRow> = report
        .smoothing
        .rows()
        .iter()
        .map(|r| GiniSmoothingRow {
            period: r.period,
            actual: r.actual,
            s1: r.s1,
            s2: r.s2,
            level: r.level,
            trend: r.trend,
            forecast: r.forecast.unwrap_or(f64::NAN),
            has_forecast: r.forecast.is_some(),
        })
        .collect();
    let future: Vec<GiniForecastPoint> = report
        .forecast
        .out_of_sample
        .iter()
        .map(|p| GiniForecastPoint {
            period: p.period,
            value: p.value,
        })
        .collect();

    let r = &mut *out_result;
    if !alloc_and_copy_array(&rows, &mut r.rows, out_error)
        || !alloc_and_copy_array(&future, &mut r.future, out_error)
    {
        gini_free_forecast_result(out_result);
        return false;
    }
    r.n_rows = rows.len();
    r.n_future = future.len();
    r.alpha = report.request.alpha.get();
    r.trend = report.forecast.trend.into();
    r.n_dropped = report.n_dropped;
    r.n_duplicates = report.n_duplicates;
    true
}

/// Evaluate the in-sample forecasts.
///
/// # Safety
/// `dataset` must be a valid handle and `out_result` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn gini_des_evaluate(
    dataset: *const GiniDataset,
    alpha: c_double,
    horizon: c_int,
    out_result: *mut GiniEvaluationResult,
    out_error: *mut GiniError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[dataset as *const c_void, out_result as *const c_void],
    ) {
        return false;
    }
    *out_result = GiniEvaluationResult::default();

    let handle = &*dataset;
    let Some(report) = ffi_try(out_error, || {
        let request = to_model_request(alpha, horizon)?;
        run_evaluation(&handle.dataset, &handle.target, &request)
    }) else {
        return false;
    };

    let eval = &report.evaluation;
    let errors: Vec<GiniErrorRow> = eval
        .rows
        .iter()
        .map(|row| GiniErrorRow {
            period: row.period,
            actual: row.actual,
            forecast: row.forecast,
            error: row.error,
            abs_error: row.abs_error,
            squared_error: row.squared_error,
        })
        .collect();

    let r = &mut *out_result;
    if !alloc_and_copy_array(&errors, &mut r.errors, out_error) {
        return false;
    }
    r.n_errors = errors.len();
    r.mae = eval.mae;
    r.mse = eval.mse;
    r.rmse = eval.rmse;
    r.mape = eval.mape.unwrap_or(f64::NAN);
    r.mape_computable = eval.mape.is_some();
    r.n_evaluated = eval.n_evaluated;
    r.n_mape = eval.n_mape;
    r.band = eval.band.into();
    true
}

// ============================================================================
// Data Preparation Functions
// ============================================================================

/// IQR outlier detection.
///
/// # Safety
/// `values` must point to `length` doubles (may be null when `length` is 0);
/// `out_result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn gini_iqr_outliers(
    values: *const c_double,
    length: size_t,
    out_result: *mut GiniOutlierResult,
    out_error: *mut GiniError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(out_error, &[out_result as *const c_void]) {
        return false;
    }
    *out_result = GiniOutlierResult::default();
    if length > 0 && check_null_pointers(out_error, &[values as *const c_void]) {
        return false;
    }

    let Some(report) = ffi_try(out_error, || {
        let values = build_series(values, ptr::null(), length);
        let values: Vec<f64> = values.into_iter().flatten().collect();
        Ok(iqr_outliers(&values))
    }) else {
        return false;
    };

    let r = &mut *out_result;
    if !alloc_and_copy_array(&report.outlier_indices, &mut r.indices, out_error) {
        return false;
    }
    r.n_outliers = report.outlier_indices.len();
    r.q1 = report.q1;
    r.q3 = report.q3;
    r.iqr = report.iqr;
    r.lower = report.lower;
    r.upper = report.upper;
    true
}

/// Linear interpolation of interior gaps, weighted by period distance.
///
/// `periods` must be sorted ascending. Leading and trailing gaps stay
/// missing (validity bit cleared).
///
/// # Safety
/// `periods` and `values` must point to `length` elements; `validity` must
/// be null or point to `length.div_ceil(64)` words.
#[no_mangle]
pub unsafe extern "C" fn gini_interpolate(
    periods: *const c_int,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    out_result: *mut GiniFilledValuesResult,
    out_error: *mut GiniError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(out_error, &[out_result as *const c_void]) {
        return false;
    }
    *out_result = GiniFilledValuesResult::default();
    if length > 0
        && check_null_pointers(out_error, &[periods as *const c_void, values as *const c_void])
    {
        return false;
    }

    let Some(filled) = ffi_try(out_error, || {
        let periods = if length == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(periods, length).to_vec()
        };
        let series = build_series(values, validity, length);
        Ok(interpolate_by_period(&periods, &series))
    }) else {
        return false;
    };

    let r = &mut *out_result;
    if !alloc_optional_values(&filled, &mut r.values, &mut r.validity, out_error) {
        return false;
    }
    r.length = filled.len();
    true
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a GiniForecastResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gini_free_forecast_result(result: *mut GiniForecastResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, rows, future);
    r.n_rows = 0;
    r.n_future = 0;
}

/// Free a GiniEvaluationResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gini_free_evaluation_result(result: *mut GiniEvaluationResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, errors);
    r.n_errors = 0;
}

/// Free a GiniOutlierResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gini_free_outlier_result(result: *mut GiniOutlierResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, indices);
    r.n_outliers = 0;
}

/// Free a GiniFilledValuesResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gini_free_filled_values_result(result: *mut GiniFilledValuesResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, values, validity);
    r.length = 0;
}

// ============================================================================
// Version
// ============================================================================

#[no_mangle]
pub extern "C" fn gini_fcst_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
