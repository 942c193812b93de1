//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Inputs are borrowed from the C caller (`*const` fields, never freed here).
//! Outputs are heap-allocated by this library (`*mut` fields) and released
//! by the matching `pipeline_free_*` function. Conversion helpers live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::io::Read;
use std::os::raw::c_char;

use json_pipeline::{Body, HeaderMap, HttpMethod, HttpRequest, JsonHttpPipeline, PipelineError};

/// Opaque handle to a `JsonHttpPipeline`. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiPipeline {
    pub(crate) inner: JsonHttpPipeline,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// How the bytes in a request body should be treated.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiBodyKind {
    Empty = 0,
    /// UTF-8 text sent as-is.
    Text = 1,
    /// Raw bytes that bypass JSON.
    Binary = 2,
    /// A JSON document the pipeline re-encodes compactly.
    Structured = 3,
}

/// A header borrowed from the C caller.
#[repr(C)]
pub struct FfiHeaderView {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// A header owned by this library.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An outbound request built by the C caller.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *const c_char,
    pub headers: *const FfiHeaderView,
    pub headers_len: u32,
    pub body_kind: FfiBodyKind,
    pub body: *const u8,
    pub body_len: usize,
}

/// A request after `pipeline_prepare_request`, ready for the wire.
///
/// `body_kind` is never `Structured`; `body` is null for `Empty`.
#[repr(C)]
pub struct FfiPreparedRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body_kind: FfiBodyKind,
    pub body: *mut u8,
    pub body_len: usize,
}

/// An inbound response described by the C caller. Fields are read, never
/// freed. `content_type` may be null.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub content_type: *const c_char,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidArgument = 1,
    InvalidUtf8 = 2,
    Serialization = 3,
    Deserialization = 4,
    Panic = 5,
    /// A binary body could not be read back out of its stream.
    BodyRead = 6,
}

/// Result envelope for `pipeline_prepare_request`.
#[repr(C)]
pub struct FfiPrepareResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub request: *mut FfiPreparedRequest,
}

/// Result envelope for `pipeline_process_response`.
///
/// `decoded` is the compact JSON of the decoded body, or null when the
/// response is not JSON or its body is empty.
#[repr(C)]
pub struct FfiProcessResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub decoded: *mut c_char,
}

/// Failures that can happen while reading C input or running the pipeline.
#[derive(Debug)]
pub(crate) enum FfiFailure {
    Pipeline(PipelineError),
    InvalidUtf8(&'static str),
    BodyRead(String),
}

impl From<PipelineError> for FfiFailure {
    fn from(err: PipelineError) -> Self {
        FfiFailure::Pipeline(err)
    }
}

impl FfiFailure {
    fn code_and_message(&self) -> (FfiErrorCode, String) {
        match self {
            FfiFailure::Pipeline(err) => {
                let code = match err {
                    PipelineError::InvalidArgument(_) => FfiErrorCode::InvalidArgument,
                    PipelineError::Serialization(_) => FfiErrorCode::Serialization,
                    PipelineError::Deserialization(_) => FfiErrorCode::Deserialization,
                };
                (code, err.to_string())
            }
            FfiFailure::InvalidUtf8(name) => {
                (FfiErrorCode::InvalidUtf8, format!("{name} is not valid UTF-8"))
            }
            FfiFailure::BodyRead(msg) => {
                (FfiErrorCode::BodyRead, format!("reading request body failed: {msg}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Move `s` into a C string; null if it contains an interior NUL.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Borrow a required C string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn required_str<'a>(
    ptr: *const c_char,
    name: &'static str,
) -> Result<&'a str, FfiFailure> {
    if ptr.is_null() {
        return Err(PipelineError::InvalidArgument(name).into());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiFailure::InvalidUtf8(name))
}

/// Borrow `len` bytes from the caller. A zero length never dereferences.
///
/// # Safety
/// `ptr` must be null or valid for `len` bytes for the lifetime `'a`.
unsafe fn bytes<'a>(ptr: *const u8, len: usize, name: &'static str) -> Result<&'a [u8], FfiFailure> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(PipelineError::InvalidArgument(name).into());
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

impl FfiHttpRequest {
    /// Copy a caller-owned request into a core `HttpRequest`.
    ///
    /// # Safety
    /// Every pointer field must follow the contract documented on the type.
    pub(crate) unsafe fn to_core(&self) -> Result<HttpRequest, FfiFailure> {
        let path = unsafe { required_str(self.path, "request.path") }?;

        let mut headers = HeaderMap::new();
        if self.headers_len > 0 {
            if self.headers.is_null() {
                return Err(PipelineError::InvalidArgument("request.headers").into());
            }
            let views = unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) };
            for view in views {
                let key = unsafe { required_str(view.key, "header.key") }?;
                let value = unsafe { required_str(view.value, "header.value") }?;
                headers.append(key, value);
            }
        }

        let raw = unsafe { bytes(self.body, self.body_len, "request.body") }?;
        let body = match self.body_kind {
            FfiBodyKind::Empty => Body::Empty,
            FfiBodyKind::Text => {
                let text = std::str::from_utf8(raw).map_err(|_| FfiFailure::InvalidUtf8("request.body"))?;
                Body::Text(text.to_string())
            }
            FfiBodyKind::Binary => Body::stream(std::io::Cursor::new(raw.to_vec())),
            FfiBodyKind::Structured => {
                let value: serde_json::Value = serde_json::from_slice(raw)
                    .map_err(|e| PipelineError::Serialization(e.into()))?;
                Body::Structured(value)
            }
        };

        Ok(HttpRequest {
            method: self.method.into(),
            path: path.to_string(),
            headers,
            body,
        })
    }
}

impl FfiPreparedRequest {
    /// Move a prepared core request onto the heap for the C caller.
    ///
    /// The body is drained before anything is allocated, so a failed read
    /// leaks nothing.
    pub(crate) fn from_core(req: HttpRequest) -> Result<*mut Self, FfiFailure> {
        let (body_kind, body) = match req.body {
            Body::Empty => (FfiBodyKind::Empty, None),
            Body::Text(text) => (FfiBodyKind::Text, Some(text.into_bytes())),
            Body::Stream(stream) => {
                let mut reader = stream
                    .lock()
                    .map_err(|_| FfiFailure::BodyRead("stream lock poisoned".to_string()))?;
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .map_err(|e| FfiFailure::BodyRead(e.to_string()))?;
                (FfiBodyKind::Binary, Some(buf))
            }
            // prepare_request never leaves a structured body behind.
            Body::Structured(value) => (FfiBodyKind::Text, Some(value.to_string().into_bytes())),
        };

        let (body, body_len) = match body {
            Some(bytes) => {
                let len = bytes.len();
                (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
            }
            None => (std::ptr::null_mut(), 0),
        };

        let entries: Vec<(String, String)> = req.headers.into();
        let headers_len = entries.len() as u32;
        let headers = if entries.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = entries
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Ok(Box::into_raw(Box::new(FfiPreparedRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body_kind,
            body,
            body_len,
        })))
    }
}

impl FfiPrepareResult {
    pub(crate) fn ok(req: HttpRequest) -> *mut Self {
        match FfiPreparedRequest::from_core(req) {
            Ok(request) => Box::into_raw(Box::new(FfiPrepareResult {
                error_code: FfiErrorCode::Ok,
                error_message: std::ptr::null_mut(),
                request,
            })),
            Err(failure) => Self::from_failure(failure),
        }
    }

    pub(crate) fn from_failure(failure: FfiFailure) -> *mut Self {
        let (error_code, msg) = failure.code_and_message();
        Self::error(error_code, msg)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg.to_string())
    }

    fn error(error_code: FfiErrorCode, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPrepareResult {
            error_code,
            error_message: into_c_string(msg),
            request: std::ptr::null_mut(),
        }))
    }
}

impl FfiProcessResult {
    pub(crate) fn ok(decoded: Option<String>) -> *mut Self {
        Box::into_raw(Box::new(FfiProcessResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            decoded: decoded.map_or(std::ptr::null_mut(), into_c_string),
        }))
    }

    pub(crate) fn from_failure(failure: FfiFailure) -> *mut Self {
        let (error_code, msg) = failure.code_and_message();
        Self::error(error_code, msg)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg.to_string())
    }

    fn error(error_code: FfiErrorCode, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiProcessResult {
            error_code,
            error_message: into_c_string(msg),
            decoded: std::ptr::null_mut(),
        }))
    }
}
