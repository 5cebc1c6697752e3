//! # Wire Codec
//!
//! All frames and payloads use bincode with its default (fixed-int, little
//! endian) configuration.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CodecError;

/// Encode a value into payload bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode payload bytes into a value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
