//! Conversion helpers for the C boundary
//!
//! Every fallible export reports failures by writing a NUL-terminated
//! message into the caller's error buffer and returning a sentinel. The
//! host releases messages with `string_free` and must never free them with
//! a generic allocator.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::slice;

use libc::c_char;
use textlite::config;
use textlite::{Error, Result};

pub const POINTER_IS_NULL: &str = "Pointer is null";

/// Write an error message into the caller's buffer, if one was provided
pub fn set_error(err: &str, error_buffer: *mut *mut c_char) {
    let err_str = match CString::new(err) {
        Ok(s) => s,
        Err(_) => return,
    };
    unsafe {
        if !error_buffer.is_null() {
            *error_buffer = err_str.into_raw();
        }
    }
}

fn process_c_str<'a>(str_ptr: *const c_char) -> Result<Cow<'a, str>> {
    if str_ptr.is_null() {
        return Err(Error::InvalidOperation(POINTER_IS_NULL.to_string()));
    }
    let cstr = unsafe { CStr::from_ptr(str_ptr) };
    if config::utf8_lenient() {
        Ok(cstr.to_string_lossy())
    } else {
        match cstr.to_str() {
            Ok(valid_str) => Ok(Cow::Borrowed(valid_str)),
            Err(err) => Err(Error::InvalidOperation(err.to_string())),
        }
    }
}

/// Copy a host string; long-living strings are always copied for safety
pub fn assert_string(str_ptr: *const c_char) -> Result<String> {
    process_c_str(str_ptr).map(Cow::into_owned)
}

/// Borrow a host string when possible; one-time-living strings avoid a copy
pub fn assert_str<'a>(str_ptr: *const c_char) -> Result<Cow<'a, str>> {
    process_c_str(str_ptr)
}

/// Check a handle for null and borrow it
pub fn assert_pointer<'a, T>(ptr: *mut T) -> Result<&'a mut T> {
    if ptr.is_null() {
        return Err(Error::InvalidOperation(POINTER_IS_NULL.to_string()));
    }
    Ok(unsafe { &mut *ptr })
}

/// Read a pointer+length array of C strings into owned strings
pub fn string_vec(ptr: *mut *const c_char, len: usize) -> Result<Vec<String>> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(Error::InvalidOperation(POINTER_IS_NULL.to_string()));
    }
    let items = unsafe { slice::from_raw_parts(ptr, len) };
    let mut out = Vec::with_capacity(len);
    for &item in items {
        out.push(assert_string(item)?);
    }
    Ok(out)
}

/// Read a pointer+length array of plain values
pub fn value_slice<'a, T>(ptr: *mut T, len: usize) -> Result<&'a [T]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(Error::InvalidOperation(POINTER_IS_NULL.to_string()));
    }
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Reclaim a boxed handle from the host
pub fn box_from<T>(ptr: *mut T) -> Box<T> {
    unsafe { Box::from_raw(ptr) }
}

/// Drop a boxed handle, ignoring null
pub fn drop_any<T>(ptr: *mut T) {
    if !ptr.is_null() {
        unsafe {
            drop(Box::from_raw(ptr));
        }
    }
}
