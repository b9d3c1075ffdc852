//! JSON envelope codec for API responses.
//!
//! Every successful response wraps its payload as `{ "result": ... }`.
//! Error responses may carry `{ "message": "..." }`.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Error type for envelope decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The body is not valid JSON or does not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The body is valid JSON but has no `result` field.
    #[error("response has no result field")]
    MissingResult,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Decodes the `result` payload of a response body.
///
/// # Errors
///
/// Returns [`CodecError::MissingResult`] if the body has no `result` key,
/// or [`CodecError::Serialization`] if it cannot be parsed as `T`.
pub fn decode_result<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let result = value
        .get_mut("result")
        .map(serde_json::Value::take)
        .ok_or(CodecError::MissingResult)?;
    serde_json::from_value(result).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Extracts the human-readable message from an error body, if any.
#[must_use]
pub fn error_message(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.is_empty())
}
