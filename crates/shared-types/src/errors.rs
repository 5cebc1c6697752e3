//! # Error Types
//!
//! Errors shared by every crate that touches the wire format.

use thiserror::Error;

/// Failure to encode or decode a frame or payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Bytes do not describe a value of the expected shape.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Payload expected to be text was not valid UTF-8.
    #[error("Invalid UTF-8 payload: {0}")]
    InvalidUtf8(String),

    /// Payload expected to be a decimal height was malformed.
    #[error("Invalid height {input:?}: {reason}")]
    InvalidHeight { input: String, reason: String },

    /// Legacy compound sign-request field was malformed.
    #[error("Malformed sign request extra {0:?}")]
    MalformedExtra(String),
}
