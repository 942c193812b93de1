//! C-ABI wrapper around `pipeline-core`.
//!
//! # Overview
//! Exposes `prepare_request` / `process_response` through `extern "C"`
//! functions so an HTTP client written in any language with a C FFI can use
//! the same content negotiation and JSON transcoding as Rust callers.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Null pipeline, request or response pointers are reported as
//!   `FfiErrorCode::InvalidArgument` before anything is read.
//! - Requests are copied in, prepared, and handed back as a new
//!   `FfiPreparedRequest`; the caller's input is never written to.
//! - The C caller owns all returned pointers and must call the matching
//!   `pipeline_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::panic::catch_unwind;

use json_pipeline::{HeaderMap, HttpResponse, PipelineError};
use serde_json::Value;

use types::*;

// ---------------------------------------------------------------------------
// Pipeline lifecycle
// ---------------------------------------------------------------------------

/// Create a pipeline using the default JSON codec.
///
/// Returns null only if an internal panic occurs. The caller must free the
/// returned pointer with `pipeline_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_new() -> *mut FfiPipeline {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiPipeline {
            inner: json_pipeline::JsonHttpPipeline::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a pipeline created by `pipeline_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_free(pipeline: *mut FfiPipeline) {
    if !pipeline.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(pipeline) });
        });
    }
}

// ---------------------------------------------------------------------------
// Pipeline operations
// ---------------------------------------------------------------------------

/// Add the default `Accept` header if missing and encode a structured body.
///
/// Always returns a result; free it with `pipeline_free_prepare_result`.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_prepare_request(
    pipeline: *const FfiPipeline,
    request: *const FfiHttpRequest,
) -> *mut FfiPrepareResult {
    catch_unwind(|| {
        if pipeline.is_null() {
            return FfiPrepareResult::from_failure(PipelineError::InvalidArgument("pipeline").into());
        }
        if request.is_null() {
            return FfiPrepareResult::from_failure(PipelineError::InvalidArgument("request").into());
        }
        let pipeline = unsafe { &*pipeline };
        let mut core_req = match unsafe { (*request).to_core() } {
            Ok(req) => req,
            Err(failure) => return FfiPrepareResult::from_failure(failure),
        };
        match pipeline.inner.prepare_request(&mut core_req) {
            Ok(_) => FfiPrepareResult::ok(core_req),
            Err(e) => {
                tracing::debug!(error = %e, "prepare_request failed");
                FfiPrepareResult::from_failure(e.into())
            }
        }
    })
    .unwrap_or_else(|_| FfiPrepareResult::panic("panic in pipeline_prepare_request"))
}

/// Decode a JSON response body.
///
/// On success `decoded` holds the compact JSON of the body, or null when the
/// response is not `application/json` or has an empty body. Always returns a
/// result; free it with `pipeline_free_process_result`.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_process_response(
    pipeline: *const FfiPipeline,
    response: *const FfiHttpResponse,
) -> *mut FfiProcessResult {
    catch_unwind(|| {
        if pipeline.is_null() {
            return FfiProcessResult::from_failure(PipelineError::InvalidArgument("pipeline").into());
        }
        if response.is_null() {
            return FfiProcessResult::from_failure(PipelineError::InvalidArgument("response").into());
        }
        let pipeline = unsafe { &*pipeline };
        let resp = unsafe { &*response };
        let mut core_resp = match ffi_response_to_core(resp) {
            Ok(r) => r,
            Err(failure) => return FfiProcessResult::from_failure(failure),
        };
        match pipeline.inner.process_response(&mut core_resp) {
            Ok(()) => FfiProcessResult::ok(core_resp.body_as_object.map(|v| v.to_string())),
            Err(e) => {
                tracing::debug!(error = %e, "process_response failed");
                FfiProcessResult::from_failure(e.into())
            }
        }
    })
    .unwrap_or_else(|_| FfiProcessResult::panic("panic in pipeline_process_response"))
}

/// Convert a C response into a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> Result<HttpResponse<Value>, FfiFailure> {
    let body = unsafe { required_str(resp.body, "response.body") }?;
    let mut headers = HeaderMap::new();
    if !resp.content_type.is_null() {
        let content_type = unsafe { required_str(resp.content_type, "response.content_type") }?;
        headers.set("Content-Type", content_type);
    }
    Ok(HttpResponse::new(resp.status, headers, body))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiPrepareResult` and the prepared request it owns.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_free_prepare_result(result: *mut FfiPrepareResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.request.is_null() {
            let req = unsafe { Box::from_raw(result.request) };
            free_c_string(req.path);
            if !req.body.is_null() {
                drop(unsafe {
                    Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.body, req.body_len))
                });
            }
            if !req.headers.is_null() && req.headers_len > 0 {
                let headers = unsafe {
                    Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                        req.headers,
                        req.headers_len as usize,
                    ))
                };
                for h in headers.iter() {
                    free_c_string(h.key);
                    free_c_string(h.value);
                }
            }
        }
    });
}

/// Free an `FfiProcessResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pipeline_free_process_result(result: *mut FfiProcessResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.decoded);
    });
}

fn free_c_string(s: *mut std::os::raw::c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
