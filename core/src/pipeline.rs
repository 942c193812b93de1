//! Request serialization and response deserialization around one HTTP
//! exchange.
//!
//! # Design
//! `JsonHttpPipeline` holds only its codec and carries no state between
//! calls. `prepare_request` runs right before the caller sends a request and
//! `process_response` right after it receives one; both mutate the message
//! they are given and touch nothing else.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::codec::{Codec, JsonCodec};
use crate::error::{PipelineError, Result};
use crate::http::{Body, HttpRequest, HttpResponse, ACCEPT, CONTENT_TYPE};

/// Media type requested when the caller did not pick one.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json; charset=utf-8";

/// Content type attached to bodies the pipeline encodes itself.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Stateless serialize/deserialize pipeline for a JSON REST API.
#[derive(Debug, Clone, Default)]
pub struct JsonHttpPipeline<C = JsonCodec> {
    codec: C,
}

impl JsonHttpPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Codec> JsonHttpPipeline<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Build a pipeline from a codec that may be missing.
    ///
    /// Fails with `InvalidArgument` instead of running without a codec.
    pub fn try_with_codec(codec: Option<C>) -> Result<Self> {
        codec
            .map(Self::with_codec)
            .ok_or(PipelineError::InvalidArgument("codec"))
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Make `request` ready for the wire.
    ///
    /// Adds the default `Accept` header unless one is already present, then
    /// encodes a structured body to text. Text, stream and empty bodies pass
    /// through as they are. On an encode failure the body is left untouched.
    pub fn prepare_request<'r>(&self, request: &'r mut HttpRequest) -> Result<&'r mut HttpRequest> {
        if request.headers.contains(ACCEPT) {
            trace!(method = %request.method, path = path_without_query(&request.path), "keeping caller Accept header");
        } else {
            request.headers.set(ACCEPT, DEFAULT_ACCEPT);
            debug!(method = %request.method, path = path_without_query(&request.path), "set default Accept header");
        }

        let encoded = match &request.body {
            Body::Empty | Body::Text(_) | Body::Stream(_) => {
                trace!(kind = request.body.kind(), "body already wire-ready");
                return Ok(request);
            }
            Body::Structured(value) => self
                .codec
                .encode(value)
                .map_err(PipelineError::Serialization)?,
        };

        debug!(len = encoded.len(), "encoded structured body");
        request.body = Body::Text(encoded);
        if !request.headers.contains(CONTENT_TYPE) {
            request.headers.set(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }
        Ok(request)
    }

    /// Decode the body of a JSON response into `body_as_object`.
    ///
    /// The slot is cleared first. Responses whose media type is not
    /// `application/json` and responses with an empty body leave it `None`.
    pub fn process_response<T: DeserializeOwned>(&self, response: &mut HttpResponse<T>) -> Result<()> {
        response.body_as_object = None;
        let content_type = response.content_type.as_deref().unwrap_or_default();
        if !is_json_content_type(content_type) {
            debug!(status = response.status, content_type, "skipping non-JSON response");
            return Ok(());
        }
        if response.body.is_empty() {
            trace!(status = response.status, "empty JSON body");
            return Ok(());
        }

        let value = self
            .codec
            .decode::<T>(&response.body)
            .map_err(PipelineError::Deserialization)?;
        debug!(status = response.status, len = response.body.len(), "decoded JSON response");
        response.body_as_object = Some(value);
        Ok(())
    }
}

/// Request path with any query string cut off, for logging. Queries may
/// carry credentials such as `access_token`.
fn path_without_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

/// Media type portion of a content type, without parameters.
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(media, _)| media)
        .trim()
}

/// Whether `content_type` names `application/json`, ignoring parameters and
/// ASCII case.
pub fn is_json_content_type(content_type: &str) -> bool {
    media_type(content_type).eq_ignore_ascii_case(JSON_MEDIA_TYPE)
}
