//! Content negotiation and body transcoding for a JSON REST API client.
//!
//! # Overview
//! Sits between an HTTP client and the API. Before a request is sent,
//! `JsonHttpPipeline::prepare_request` makes sure it carries an `Accept`
//! header and a wire-ready body. After a response arrives,
//! `JsonHttpPipeline::process_response` decodes JSON bodies into the type the
//! caller asked for. The core never touches the network (host-does-IO
//! pattern).
//!
//! # Design
//! - `JsonHttpPipeline` is stateless; it holds only its `Codec`.
//! - The request body is a closed `Body` enum so body handling is exhaustive.
//! - `HeaderMap` keeps caller casing but looks names up case-insensitively.
//! - Types use owned `String` / `Vec` fields to keep the FFI mapping simple.

pub mod codec;
pub mod error;
pub mod http;
pub mod pipeline;

pub use codec::{Codec, JsonCodec};
pub use error::{CodecError, PipelineError, Result};
pub use http::{Body, BodyStream, HeaderMap, HttpMethod, HttpRequest, HttpResponse};
pub use pipeline::{is_json_content_type, media_type, JsonHttpPipeline, DEFAULT_ACCEPT, JSON_CONTENT_TYPE};
