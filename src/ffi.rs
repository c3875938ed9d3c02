//! FFI bindings for Circadia
//!
//! C-compatible entry points for calling the engine from host applications.
//! All functions take and return null-terminated JSON strings; returned
//! memory must be freed by the caller using `circadia_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::{EngineConfig, ExtractConfig};
use crate::engine::{ReportOptions, SleepEngine};
use crate::extract::parse_history_json;
use crate::report::ReportEncoder;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn engine_with_offset(utc_offset_minutes: i32) -> SleepEngine {
    let config = EngineConfig {
        extract: ExtractConfig { utc_offset_minutes },
        ..EngineConfig::default()
    };
    SleepEngine::new(config)
}

/// Compute a full sleep report from a JSON array of daily vitals records.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `circadia_free_string`.
/// - Returns NULL on error; call `circadia_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn circadia_report_json(
    history_json: *const c_char,
    utc_offset_minutes: i32,
    now_hour: f64,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(history_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid history JSON string pointer");
            return ptr::null_mut();
        }
    };

    let history = match parse_history_json(&json_str) {
        Ok(records) => records,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let engine = engine_with_offset(utc_offset_minutes);
    let options = ReportOptions {
        now_hour,
        ..ReportOptions::default()
    };
    let report = engine.report(&history, &options);

    match ReportEncoder::new().encode_to_json(report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute the rolling sleep debt from a JSON array of daily vitals records.
///
/// Pass `need_hours <= 0` to derive the personalized need from the history.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `circadia_free_string`.
/// - Returns NULL on error; call `circadia_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn circadia_sleep_debt_json(
    history_json: *const c_char,
    need_hours: f64,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(history_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid history JSON string pointer");
            return ptr::null_mut();
        }
    };

    let history = match parse_history_json(&json_str) {
        Ok(records) => records,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let engine = SleepEngine::default();
    let result = if need_hours > 0.0 {
        engine.sleep_debt_with_need(&history, need_hours)
    } else {
        engine.sleep_debt(&history)
    };

    match serde_json::to_string(&result) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute the 24-hour energy curve from a JSON array of daily vitals
/// records.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `circadia_free_string`.
/// - Returns NULL on error (including insufficient history for a
///   chronotype profile); call `circadia_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn circadia_energy_curve_json(
    history_json: *const c_char,
    utc_offset_minutes: i32,
    now_hour: f64,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(history_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid history JSON string pointer");
            return ptr::null_mut();
        }
    };

    let history = match parse_history_json(&json_str) {
        Ok(records) => records,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let engine = engine_with_offset(utc_offset_minutes);
    match engine.energy_curve(&history, now_hour, &[]) {
        Some(curve) => match serde_json::to_string(&curve) {
            Ok(json) => string_to_cstr(&json),
            Err(e) => {
                set_last_error(&e.to_string());
                ptr::null_mut()
            }
        },
        None => {
            set_last_error("Insufficient history for a chronotype profile");
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Circadia functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Circadia function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn circadia_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Circadia call on this
///   thread. Do NOT free it.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn circadia_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Circadia library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn circadia_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_history_json() -> CString {
        // 14 nights ending 2024-03-14, 23:00-07:00 with stage minutes
        let mut records = Vec::new();
        for i in 0..14 {
            let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
                - chrono::Duration::days(i);
            let midnight_ms = day
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp_millis();
            records.push(serde_json::json!({
                "date": day.format("%Y-%m-%d").to_string(),
                "sleepStartTimestamp": midnight_ms - 3_600_000,
                "sleepEndTimestamp": (midnight_ms + 7 * 3_600_000).to_string(),
                "deepSleepMinutes": 90,
                "remSleepMinutes": 105,
                "lightSleepMinutes": 225,
                "sleepScore": 80,
                "recoveryScore": 72
            }));
        }
        CString::new(serde_json::to_string(&records).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_report() {
        let history = sample_history_json();
        unsafe {
            let result = circadia_report_json(history.as_ptr(), 0, 14.0);
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["producer"]["name"], "circadia");
            assert!(value["report"]["chronotype"].is_object());

            circadia_free_string(result);
        }
    }

    #[test]
    fn test_ffi_sleep_debt_with_explicit_need() {
        let history = sample_history_json();
        unsafe {
            let result = circadia_sleep_debt_json(history.as_ptr(), 8.0);
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            // 7h nights against an 8h need accumulate debt
            assert!(value["total_debt_hours"].as_f64().unwrap() > 0.0);
            assert_eq!(value["daily_breakdown"].as_array().unwrap().len(), 14);

            circadia_free_string(result);
        }
    }

    #[test]
    fn test_ffi_energy_curve() {
        let history = sample_history_json();
        unsafe {
            let result = circadia_energy_curve_json(history.as_ptr(), 0, 10.0);
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["points"].as_array().unwrap().len(), 96);

            circadia_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = circadia_report_json(invalid.as_ptr(), 0, 12.0);
            assert!(result.is_null());

            let error = circadia_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_ffi_insufficient_history_is_error_for_curve() {
        unsafe {
            let empty = CString::new("[]").unwrap();
            let result = circadia_energy_curve_json(empty.as_ptr(), 0, 12.0);
            assert!(result.is_null());

            let error = CStr::from_ptr(circadia_last_error()).to_str().unwrap();
            assert!(error.contains("Insufficient"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = circadia_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
