//! C FFI bindings for the tpl-i18n extraction engine.
//!
//! Exposes `ti_transform_json`, `ti_transform_file_json` and `ti_string_free`
//! for build tools written in other languages. Key policies are passed as
//! `SequentialKeys` JSON, results come back as `{"code", "langMap"}` JSON.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use tpl_i18n::{SequentialKeys, TplI18nError, Transformed};

/// Extract markers from a template string.
///
/// # Safety
///
/// - `source_utf8` must be a valid null-terminated UTF-8 string.
/// - `options_json_utf8_or_null` may be null (default policy), or a valid
///   null-terminated UTF-8 JSON object such as
///   `{"prefix": "node_test_", "start": 1, "expression": "{[ this.{key} ]}"}`.
/// - `out_error_json_utf8` must be a valid pointer to a `*mut c_char` (initially null).
///
/// On success, returns a pointer to a null-terminated UTF-8 JSON string
/// `{"code": ..., "langMap": {...}}`. The caller must free it with `ti_string_free`.
///
/// On error, returns null and writes an error JSON string to `*out_error_json_utf8`.
/// The caller must free the error string with `ti_string_free`. Error types are
/// `EmptyKey`, `IllegalMutation`, `KeysExhausted`, `InvalidEdit`, `IoError`,
/// `OptionsError` (unreadable arguments) and `EncodeError` (result could not be
/// encoded as a JSON C string).
#[no_mangle]
pub unsafe extern "C" fn ti_transform_json(
    source_utf8: *const c_char,
    options_json_utf8_or_null: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let source = match read_str(source_utf8) {
        Ok(s) => s,
        Err(message) => {
            write_error(out_error_json_utf8, "OptionsError", &message);
            return ptr::null_mut();
        }
    };

    let policy = match read_policy(options_json_utf8_or_null) {
        Ok(policy) => policy,
        Err(message) => {
            write_error(out_error_json_utf8, "OptionsError", &message);
            return ptr::null_mut();
        }
    };

    finish(tpl_i18n::transform(source, policy), out_error_json_utf8)
}

/// Extract markers from a template file.
///
/// Relative paths are resolved against the process's current directory.
///
/// # Safety
///
/// Same contract as [`ti_transform_json`], with `path_utf8` in place of the
/// template source.
#[no_mangle]
pub unsafe extern "C" fn ti_transform_file_json(
    path_utf8: *const c_char,
    options_json_utf8_or_null: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let path = match read_str(path_utf8) {
        Ok(s) => s,
        Err(message) => {
            write_error(out_error_json_utf8, "OptionsError", &message);
            return ptr::null_mut();
        }
    };

    let policy = match read_policy(options_json_utf8_or_null) {
        Ok(policy) => policy,
        Err(message) => {
            write_error(out_error_json_utf8, "OptionsError", &message);
            return ptr::null_mut();
        }
    };

    finish(tpl_i18n::transform_from_file(path, policy), out_error_json_utf8)
}

/// Free a string previously returned by this crate or written to `out_error_json_utf8`.
///
/// # Safety
///
/// `p` must be a pointer previously returned by this crate via `CString::into_raw`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn ti_string_free(p: *mut c_char) {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
}

unsafe fn read_str<'a>(p: *const c_char) -> Result<&'a str, String> {
    if p.is_null() {
        return Err("unexpected null pointer".to_string());
    }
    CStr::from_ptr(p).to_str().map_err(|e| e.to_string())
}

unsafe fn read_policy(p: *const c_char) -> Result<SequentialKeys, String> {
    if p.is_null() {
        return Ok(SequentialKeys::default());
    }
    let json = read_str(p)?;
    serde_json::from_str(json).map_err(|e| format!("Invalid options: {e}"))
}

unsafe fn finish(
    result: tpl_i18n::Result<Transformed>,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let transformed = match result {
        Ok(transformed) => transformed,
        Err(err) => {
            write_tpl_error(out_error_json_utf8, &err);
            return ptr::null_mut();
        }
    };

    let json = match serde_json::to_string(&transformed) {
        Ok(json) => json,
        Err(e) => {
            write_error(out_error_json_utf8, "EncodeError", &e.to_string());
            return ptr::null_mut();
        }
    };

    match CString::new(json) {
        Ok(cs) => cs.into_raw(),
        Err(e) => {
            write_error(out_error_json_utf8, "EncodeError", &e.to_string());
            ptr::null_mut()
        }
    }
}

/// Convert a `TplI18nError` to error JSON and write it to the output pointer.
unsafe fn write_tpl_error(out: *mut *mut c_char, err: &TplI18nError) {
    let error_type = match err {
        TplI18nError::EmptyKey => "EmptyKey",
        TplI18nError::IllegalMutation => "IllegalMutation",
        TplI18nError::KeysExhausted { .. } => "KeysExhausted",
        TplI18nError::InvalidEdit { .. } => "InvalidEdit",
        TplI18nError::IoError(_) => "IoError",
    };

    write_error(out, error_type, &err.to_string());
}

/// Write an error JSON string to the output pointer.
unsafe fn write_error(out: *mut *mut c_char, error_type: &str, message: &str) {
    if out.is_null() {
        return;
    }

    let json = serde_json::json!({
        "type": error_type,
        "message": message,
    });

    if let Ok(cs) = CString::new(json.to_string()) {
        *out = cs.into_raw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use tempfile::TempDir;

    unsafe fn take_json(p: *mut c_char) -> serde_json::Value {
        let json = CStr::from_ptr(p).to_str().unwrap();
        let value = serde_json::from_str(json).unwrap();
        ti_string_free(p);
        value
    }

    #[test]
    fn test_transform_simple() {
        let source = CString::new("<p><lang>你好</lang></p>").unwrap();
        let options =
            CString::new(r#"{"prefix": "node_test_", "expression": "{[ this.{key} ]}"}"#).unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_json(source.as_ptr(), options.as_ptr(), &mut err_ptr);
            assert!(!result.is_null(), "Expected non-null result");
            assert!(err_ptr.is_null());

            let value = take_json(result);
            assert_eq!(value["code"], "<p>{[ this.node_test_1 ]}</p>");
            assert_eq!(value["langMap"]["node_test_1"], "你好");
        }
    }

    #[test]
    fn test_lang_map_keeps_order() {
        let source = CString::new("<lang>b</lang><lang>a</lang>").unwrap();
        let options = CString::new(r#"{"prefix": "z", "start": 8}"#).unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_json(source.as_ptr(), options.as_ptr(), &mut err_ptr);
            let json = CStr::from_ptr(result).to_str().unwrap().to_string();
            ti_string_free(result);
            assert_eq!(json, r#"{"code":"z8z9","langMap":{"z8":"b","z9":"a"}}"#);
        }
    }

    #[test]
    fn test_default_options() {
        let source = CString::new("<lang>x</lang>").unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_json(source.as_ptr(), ptr::null(), &mut err_ptr);
            let value = take_json(result);
            assert_eq!(value["code"], "1");
            assert_eq!(value["langMap"]["1"], "x");
        }
    }

    #[test]
    fn test_invalid_options() {
        let source = CString::new("<lang>x</lang>").unwrap();
        let options = CString::new("not valid json").unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_json(source.as_ptr(), options.as_ptr(), &mut err_ptr);
            assert!(result.is_null());
            assert!(!err_ptr.is_null());

            let err = take_json(err_ptr);
            assert_eq!(err["type"], "OptionsError");
        }
    }

    #[test]
    fn test_missing_file() {
        let path = CString::new("definitely/not/here.tpl").unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_file_json(path.as_ptr(), ptr::null(), &mut err_ptr);
            assert!(result.is_null());
            assert!(!err_ptr.is_null());

            let err = take_json(err_ptr);
            assert_eq!(err["type"], "IoError");
            assert!(err["message"].as_str().unwrap().starts_with("IO error"));
        }
    }

    #[test]
    fn test_transform_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("page.tpl");
        std::fs::write(&file, r#"<input placeholder='<lang>请输入</lang>' />"#).unwrap();

        let path = CString::new(file.to_str().unwrap()).unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_file_json(path.as_ptr(), ptr::null(), &mut err_ptr);
            let value = take_json(result);
            assert_eq!(value["code"], "<input placeholder='1' />");
            assert_eq!(value["langMap"]["1"], "请输入");
        }
    }

    #[test]
    fn test_nul_in_template_is_escaped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nul.tpl");
        std::fs::write(&file, "a\0b<lang>x</lang>").unwrap();

        let path = CString::new(file.to_str().unwrap()).unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_file_json(path.as_ptr(), ptr::null(), &mut err_ptr);
            assert!(!result.is_null());
            assert!(err_ptr.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap().to_string();
            ti_string_free(result);
            assert!(json.contains(r"a\u0000b1"));
        }
    }

    #[test]
    fn test_key_counter_overflow() {
        let source = CString::new("<lang>a</lang><lang>b</lang>").unwrap();
        let options = CString::new(r#"{"start": 18446744073709551615}"#).unwrap();
        let mut err_ptr: *mut c_char = ptr::null_mut();

        unsafe {
            let result = ti_transform_json(source.as_ptr(), options.as_ptr(), &mut err_ptr);
            assert!(result.is_null());
            assert!(!err_ptr.is_null());

            let err = take_json(err_ptr);
            assert_eq!(err["type"], "KeysExhausted");
        }
    }

    #[test]
    fn test_string_free_null() {
        // Should be a no-op
        unsafe {
            ti_string_free(ptr::null_mut());
        }
    }
}
