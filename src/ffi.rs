//! C ABI for trip-metrics
//!
//! Snapshots and reports cross the boundary as UTF-8 JSON in NUL-terminated
//! strings. Every string handed out is owned by the caller and goes back
//! through `tripm_free_string`. Failures return NULL (or -1) and leave a
//! message for `tripm_last_error` on the calling thread.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::MetricsError;
use crate::pipeline::{snapshot_json_to_metrics, MetricsProcessor};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| *e.borrow_mut() = CString::new(msg).ok());
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Borrow a caller string as UTF-8; NULL and invalid UTF-8 both record an error
unsafe fn read_json<'a>(json: *const c_char) -> Option<&'a str> {
    let text = if json.is_null() {
        None
    } else {
        CStr::from_ptr(json).to_str().ok()
    };
    if text.is_none() {
        set_last_error("JSON argument is NULL or not UTF-8");
    }
    text
}

unsafe fn processor_mut<'a>(
    processor: *mut MetricsProcessorHandle,
) -> Option<&'a mut MetricsProcessor> {
    if processor.is_null() {
        set_last_error("Null processor pointer");
        return None;
    }
    Some(&mut (*processor).processor)
}

/// Hand a result to the caller as an owned C string, NULL on failure
fn into_c_string(result: Result<String, MetricsError>) -> *mut c_char {
    let text = match result {
        Ok(text) => text,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    match CString::new(text) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Output contains an interior NUL byte");
            ptr::null_mut()
        }
    }
}

/// Compute metrics for a snapshot and return them as JSON.
///
/// # Safety
/// `json` must be NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tripm_compute_metrics(json: *const c_char) -> *mut c_char {
    clear_last_error();
    match read_json(json) {
        Some(json) => into_c_string(snapshot_json_to_metrics(json.to_string())),
        None => ptr::null_mut(),
    }
}

/// Opaque processor handed to C callers
pub struct MetricsProcessorHandle {
    processor: MetricsProcessor,
}

/// Allocate a processor with the built-in route table. Release it with
/// `tripm_processor_free`.
///
/// # Safety
/// Always safe to call; the pointer is owned by the caller.
#[no_mangle]
pub unsafe extern "C" fn tripm_processor_new() -> *mut MetricsProcessorHandle {
    clear_last_error();
    Box::into_raw(Box::new(MetricsProcessorHandle {
        processor: MetricsProcessor::new(),
    }))
}

/// # Safety
/// `processor` must be NULL or come from `tripm_processor_new`, and is
/// dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn tripm_processor_free(processor: *mut MetricsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Return a metrics report for a snapshot, reusing the cached result when the
/// snapshot has not changed since the previous call.
///
/// # Safety
/// `processor` must be NULL or a live handle from `tripm_processor_new`.
/// `json` must be NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tripm_processor_process(
    processor: *mut MetricsProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();
    let Some(processor) = processor_mut(processor) else {
        return ptr::null_mut();
    };
    match read_json(json) {
        Some(json) => into_c_string(processor.process_json(json)),
        None => ptr::null_mut(),
    }
}

/// Current route table as JSON.
///
/// # Safety
/// `processor` must be NULL or a live handle from `tripm_processor_new`.
#[no_mangle]
pub unsafe extern "C" fn tripm_processor_save_config(
    processor: *mut MetricsProcessorHandle,
) -> *mut c_char {
    clear_last_error();
    match processor_mut(processor) {
        Some(processor) => into_c_string(processor.save_config()),
        None => ptr::null_mut(),
    }
}

/// Replace the route table. Returns 0 on success and -1 on failure.
///
/// # Safety
/// `processor` must be NULL or a live handle from `tripm_processor_new`.
/// `json` must be NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tripm_processor_load_config(
    processor: *mut MetricsProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();
    let Some(processor) = processor_mut(processor) else {
        return -1;
    };
    let Some(json) = read_json(json) else {
        return -1;
    };
    match processor.load_config(json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// # Safety
/// `ptr` must be NULL or a string returned by a `tripm_*` function that has
/// not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn tripm_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Message of the last failure on this thread, or NULL.
///
/// # Safety
/// The string is borrowed: do not free it, and do not use it after the next
/// `tripm_*` call on the same thread.
#[no_mangle]
pub unsafe extern "C" fn tripm_last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ref().map_or(ptr::null(), |cstr| cstr.as_ptr()))
}

/// # Safety
/// Returns a static string; do not free it.
#[no_mangle]
pub unsafe extern "C" fn tripm_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
