//! Stable JSON encoding for files written to disk.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for on-disk JSON encoding.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Encoding failed.
    #[error("JSON encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The document is not valid JSON or has the wrong shape.
    #[error("JSON decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes a value as pretty JSON bytes ending with a newline.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    value
        .serialize(&mut serializer)
        .map_err(SerializationError::Encode)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Decodes JSON bytes, pretty or minified.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for `T`.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Decode)
}
