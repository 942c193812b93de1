//! Pluggable JSON encode/decode capability.
//!
//! The pipeline treats the codec as a black box: it hands structured request
//! bodies to `encode` and JSON response text to `decode`, and never inspects
//! either side of the conversion.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CodecError;

/// Stateless serializer/deserializer used by `JsonHttpPipeline`.
///
/// Implementations must be reentrant; the pipeline may call them from many
/// threads at once.
pub trait Codec {
    /// Encode a structured value as compact wire text.
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    /// Decode `text` into the caller's target type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;
}

/// Default codec backed by `serde_json`. Output has no insignificant
/// whitespace and keeps object keys in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl<C: Codec> Codec for &C {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        (**self).encode(value)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        (**self).decode(text)
    }
}

impl<C: Codec> Codec for std::sync::Arc<C> {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        (**self).encode(value)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        (**self).decode(text)
    }
}
