//! Parameter conversion utilities for FFI functions.

use core::ffi::{c_char, c_double, c_int};
use std::ffi::CStr;

use gini_fcst_core::{ForecastError, ModelRequest, Result};
use libc::size_t;

/// Convert a C string pointer to a Rust `&str` with a default value.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
#[inline]
pub unsafe fn c_str_to_str(ptr: *const c_char, default: &str) -> &str {
    if ptr.is_null() {
        default
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or(default)
    }
}

/// Convert a required C string, rejecting null and invalid UTF-8.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
pub unsafe fn c_str_required<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(ForecastError::NullPointer(name.to_string()));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| ForecastError::InvalidInput(format!("{} is not valid UTF-8", name)))
}

/// Validate raw alpha/horizon controls into a request.
pub fn to_model_request(alpha: c_double, horizon: c_int) -> Result<ModelRequest> {
    let horizon = usize::try_from(horizon).map_err(|_| {
        ForecastError::InvalidParameter {
            param: "horizon".to_string(),
            value: horizon.to_string(),
            reason: "must be positive".to_string(),
        }
    })?;
    ModelRequest::new(alpha, horizon)
}

/// Build a series with NULL handling from raw pointers.
///
/// Bit i of `validity[i / 64]` marks element i as present; a null validity
/// pointer means every element is present.
///
/// # Safety
/// `data` must point to `length` doubles; `validity` must be null or point to
/// `length.div_ceil(64)` words.
pub unsafe fn build_series(
    data: *const c_double,
    validity: *const u64,
    length: size_t,
) -> Vec<Option<f64>> {
    if length == 0 {
        return Vec::new();
    }
    let data_slice = std::slice::from_raw_parts(data, length);

    if validity.is_null() {
        data_slice.iter().map(|&v| Some(v)).collect()
    } else {
        let validity_slice = std::slice::from_raw_parts(validity, length.div_ceil(64));
        (0..length)
            .map(|i| {
                let word = validity_slice[i / 64];
                if (word >> (i % 64)) & 1 == 1 {
                    Some(data_slice[i])
                } else {
                    None
                }
            })
            .collect()
    }
}
