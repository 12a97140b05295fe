//! Memory allocation utilities for FFI result arrays.
//!
//! Every array handed to the host is allocated with `malloc` and released by
//! the matching `gini_free_*` function.

use crate::types::{ErrorCode, GiniError};
use core::ffi::c_double;
use std::ptr;

// Memory allocation - use libc on native, std::alloc on WASM
#[cfg(not(target_family = "wasm"))]
use libc::{free, malloc};

#[cfg(target_family = "wasm")]
unsafe fn malloc(size: usize) -> *mut core::ffi::c_void {
    use std::alloc::{alloc, Layout};
    match Layout::from_size_align(size, 8) {
        Ok(layout) => alloc(layout) as *mut core::ffi::c_void,
        Err(_) => ptr::null_mut(),
    }
}

#[cfg(target_family = "wasm")]
unsafe fn free(ptr: *mut core::ffi::c_void) {
    use std::alloc::{dealloc, Layout};
    if !ptr.is_null() {
        if let Ok(layout) = Layout::from_size_align(1, 8) {
            dealloc(ptr as *mut u8, layout);
        }
    }
}

/// Allocate and copy an array, setting error on failure.
///
/// An empty slice yields a null pointer and counts as success.
///
/// # Safety
/// out_ptr must be a valid pointer; out_error must be valid if non-null.
pub unsafe fn alloc_and_copy_array<T: Copy>(
    items: &[T],
    out_ptr: *mut *mut T,
    out_error: *mut GiniError,
) -> bool {
    if items.is_empty() {
        *out_ptr = ptr::null_mut();
        return true;
    }

    let ptr = malloc(std::mem::size_of_val(items)) as *mut T;
    if ptr.is_null() {
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    ptr::copy_nonoverlapping(items.as_ptr(), ptr, items.len());
    *out_ptr = ptr;
    true
}

/// Allocate a zeroed validity bitmask for n elements.
///
/// # Safety
/// Returns null on allocation failure or if n is 0.
pub unsafe fn alloc_validity(n: usize) -> *mut u64 {
    if n == 0 {
        return ptr::null_mut();
    }
    let n_words = n.div_ceil(64);
    let validity = malloc(n_words * std::mem::size_of::<u64>()) as *mut u64;
    if !validity.is_null() {
        ptr::write_bytes(validity, 0, n_words);
    }
    validity
}

/// Free a C pointer using platform-appropriate free function.
///
/// # Safety
/// ptr must be either null or a valid pointer allocated by malloc.
#[inline]
pub unsafe fn free_ptr(ptr: *mut core::ffi::c_void) {
    if !ptr.is_null() {
        free(ptr);
    }
}

/// Macro to free multiple struct fields.
///
/// Usage:
/// ```ignore
/// free_fields!(result, field1, field2, field3);
/// ```
#[macro_export]
macro_rules! free_fields {
    ($result:expr, $($field:ident),+ $(,)?) => {{
        $(
            if !$result.$field.is_null() {
                $crate::allocation::free_ptr($result.$field as *mut core::ffi::c_void);
                $result.$field = std::ptr::null_mut();
            }
        )+
    }};
}

/// Set a validity bit in a bitmask.
///
/// # Safety
/// The validity pointer must be valid and point to an array with sufficient
/// capacity for the given index (at least `index / 64 + 1` u64 words).
#[inline]
pub unsafe fn set_validity_bit(validity: *mut u64, index: usize, is_valid: bool) {
    if validity.is_null() {
        return;
    }
    let word_idx = index / 64;
    let bit_idx = index % 64;
    if is_valid {
        *validity.add(word_idx) |= 1u64 << bit_idx;
    } else {
        *validity.add(word_idx) &= !(1u64 << bit_idx);
    }
}

/// Allocate values and validity arrays from `Option<f64>` data.
///
/// Missing entries are written as NaN with their validity bit cleared.
///
/// # Safety
/// out_values and out_validity must be valid pointers; out_error must be
/// valid if non-null.
pub unsafe fn alloc_optional_values(
    data: &[Option<f64>],
    out_values: *mut *mut c_double,
    out_validity: *mut *mut u64,
    out_error: *mut GiniError,
) -> bool {
    let values: Vec<f64> = data.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    if !alloc_and_copy_array(&values, out_values, out_error) {
        return false;
    }
    if data.is_empty() {
        *out_validity = ptr::null_mut();
        return true;
    }

    let validity = alloc_validity(data.len());
    if validity.is_null() {
        free_ptr(*out_values as *mut core::ffi::c_void);
        *out_values = ptr::null_mut();
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }
    for (i, v) in data.iter().enumerate() {
        set_validity_bit(validity, i, v.is_some());
    }
    *out_validity = validity;
    true
}
