//! HTTP message types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The pipeline mutates them in place
//! right before the caller sends a request and right after it receives a
//! response; the caller owns the actual network round-trip.
//!
//! The request body is a closed enum so body handling is an exhaustive
//! `match` rather than runtime type inspection. Header names are stored with
//! the casing the caller used, but every lookup ignores ASCII case.

use std::fmt;
use std::io::Read;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::error::{CodecError, PipelineError};

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First value stored under `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set `name` to `value`.
    ///
    /// An existing entry keeps its position and the casing it was stored
    /// with; any later duplicates are dropped.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => {
                self.entries[i].1 = value.into();
                let mut seen = 0usize;
                self.entries.retain(|(k, _)| {
                    if !k.eq_ignore_ascii_case(&name) {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.entries.push((name, value.into())),
        }
    }

    /// Add an entry without touching existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every entry stored under `name`, returning the first value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.position(name).map(|i| self.entries[i].1.clone());
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        first
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HeaderMap> for Vec<(String, String)> {
    fn from(headers: HeaderMap) -> Self {
        headers.entries
    }
}

/// Shared handle to a raw binary upload.
pub type BodyStream = Arc<Mutex<dyn Read + Send>>;

/// Request payload.
#[derive(Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Already wire-ready text.
    Text(String),
    /// Raw bytes that bypass JSON entirely.
    Stream(BodyStream),
    /// In-memory value waiting to be encoded by the pipeline's codec.
    Structured(Value),
}

impl Body {
    /// Capture any `Serialize` value as a structured body.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, PipelineError> {
        serde_json::to_value(value)
            .map(Body::Structured)
            .map_err(|e| PipelineError::Serialization(CodecError::from(e)))
    }

    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        Body::Stream(Arc::new(Mutex::new(reader)))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// True once nothing is left for a codec to do.
    pub fn is_wire_ready(&self) -> bool {
        !matches!(self, Body::Structured(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&BodyStream> {
        match self {
            Body::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Text(_) => "text",
            Body::Stream(_) => "stream",
            Body::Structured(_) => "structured",
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
            Body::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Structured(value)
    }
}

/// An outbound HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// An inbound HTTP response described as plain data.
///
/// `T` is the type the caller expects the body to decode into. The pipeline
/// fills `body_as_object` only for JSON responses.
#[derive(Debug, Clone)]
pub struct HttpResponse<T = Value> {
    pub status: u16,
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    pub body: String,
    pub body_as_object: Option<T>,
}

impl<T> HttpResponse<T> {
    /// Build a response, taking `content_type` from the `Content-Type` header.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        let content_type = headers.get(CONTENT_TYPE).map(str::to_string);
        Self {
            status,
            headers,
            content_type,
            body: body.into(),
            body_as_object: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
