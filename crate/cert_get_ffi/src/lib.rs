//! C interface to `cert_get_core`, for front ends written in other languages.
//!
//! Every call is blocking: GUI hosts must call [`download_certs`] from a
//! worker thread. Error messages are kept per thread, see
//! [`cert_get_last_error`].

use std::{
    cell::RefCell,
    ffi::{CStr, CString},
    os::raw::{c_char, c_int},
    panic::{self, AssertUnwindSafe},
    ptr,
};

use cert_get_core::Error;
use log::debug;

pub const CERT_GET_OK: c_int = 0;
pub const CERT_GET_ERR_ARGUMENT: c_int = -1;
pub const CERT_GET_ERR_INVALID_ADDRESS: c_int = -2;
pub const CERT_GET_ERR_CONNECTION: c_int = -3;
pub const CERT_GET_ERR_HANDSHAKE: c_int = -4;
pub const CERT_GET_ERR_CERTIFICATE_PARSE: c_int = -5;
pub const CERT_GET_ERR_OUTPUT_DIR: c_int = -6;
pub const CERT_GET_ERR_WRITE: c_int = -7;
pub const CERT_GET_ERR_PANIC: c_int = -8;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(message: String) {
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|last| *last.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|last| *last.borrow_mut() = None);
}

pub fn status_code(error: &Error) -> c_int {
    match error {
        Error::InvalidAddress { .. } => CERT_GET_ERR_INVALID_ADDRESS,
        Error::ConnectionError(_) => CERT_GET_ERR_CONNECTION,
        Error::HandshakeError(_) => CERT_GET_ERR_HANDSHAKE,
        Error::CertificateParseError { .. } => CERT_GET_ERR_CERTIFICATE_PARSE,
        Error::OutputDirError { .. } => CERT_GET_ERR_OUTPUT_DIR,
        Error::WriteError { .. } => CERT_GET_ERR_WRITE,
    }
}

/// Run `call`, turning a panic into [`CERT_GET_ERR_PANIC`] instead of
/// unwinding into the host
fn guarded<F: FnOnce() -> c_int>(call: F) -> c_int {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        set_last_error(format!("internal error: {reason}"));
        CERT_GET_ERR_PANIC
    })
}

/// # Safety
///
/// `value` is NULL or a NUL-terminated string alive for `'a`.
unsafe fn str_arg<'a>(value: *const c_char, name: &str) -> Result<&'a str, String> {
    if value.is_null() {
        return Err(format!("{name} is NULL"));
    }

    CStr::from_ptr(value)
        .to_str()
        .map_err(|e| format!("{name} is not a valid utf-8 string: {e}"))
}

/// Check the library is linked and callable
#[no_mangle]
pub extern "C" fn say_hello() {
    println!("hello from cert_get_ffi {}", env!("CARGO_PKG_VERSION"));
}

/// Download the certificate chain of `url` (`host:port`) into `output_dir`.
///
/// Returns [`CERT_GET_OK`] or a negative `CERT_GET_ERR_*` code naming the
/// failing stage. The message is available from [`cert_get_last_error`].
///
/// # Safety
///
/// `url` and `output_dir` must be NULL or point to NUL-terminated strings
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn download_certs(url: *const c_char, output_dir: *const c_char) -> c_int {
    clear_last_error();

    let (url, output_dir) = match (str_arg(url, "url"), str_arg(output_dir, "output_dir")) {
        (Ok(url), Ok(output_dir)) => (url, output_dir),
        (Err(message), _) | (_, Err(message)) => {
            set_last_error(message);
            return CERT_GET_ERR_ARGUMENT;
        }
    };

    guarded(|| match cert_get_core::download_certs(url, output_dir) {
        Ok(summary) => {
            debug!("{url}: {} certificate(s) written", summary.count);
            CERT_GET_OK
        }
        Err(error) => {
            set_last_error(error.to_string());
            status_code(&error)
        }
    })
}

/// Message of the last failed call on this thread, or NULL.
///
/// The pointer stays valid until the next [`download_certs`] call on the
/// same thread. It must not be freed by the caller.
#[no_mangle]
pub extern "C" fn cert_get_last_error() -> *const c_char {
    LAST_ERROR.with(|last| {
        last.borrow()
            .as_ref()
            .map_or(ptr::null(), |message| message.as_ptr())
    })
}
