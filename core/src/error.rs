//! Error types for the JSON HTTP pipeline.
//!
//! # Design
//! The pipeline never recovers from a failure locally. Codec failures are
//! wrapped once, tagged with the direction they happened in, and handed back
//! to the caller with the original `CodecError` intact as the source.
//! `InvalidArgument` is raised before any mutation takes place.

use thiserror::Error;

/// Failure reported by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
    #[source]
    source: Option<serde_json::Error>,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Errors returned by `JsonHttpPipeline`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required argument was missing (a null codec, or a null pointer
    /// handed across the C boundary).
    #[error("invalid argument: {0} must not be null")]
    InvalidArgument(&'static str),

    /// The structured request body could not be encoded. The body was left
    /// as it was.
    #[error("serialization failed: {0}")]
    Serialization(#[source] CodecError),

    /// A response flagged as JSON could not be decoded into the target type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] CodecError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_argument_names_the_argument() {
        let err = PipelineError::InvalidArgument("codec");
        assert_eq!(err.to_string(), "invalid argument: codec must not be null");
    }

    #[test]
    fn codec_error_keeps_serde_source() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = PipelineError::Deserialization(CodecError::from(json_err));
        let codec_err = err.source().unwrap();
        assert!(codec_err.source().is_some());
        assert!(err.to_string().starts_with("deserialization failed: "));
    }

    #[test]
    fn custom_codec_error_has_no_source() {
        let err = CodecError::new("cycle detected");
        assert_eq!(err.message(), "cycle detected");
        assert!(err.source().is_none());
    }
}
