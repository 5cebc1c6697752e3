//! Error types for the peer control plane.
//!
//! Every handler failure is logged with its [`ErrorClass`] and never replied
//! to. Silence is the only failure signal a remote peer ever sees.

use shared_types::{CodecError, IbtpDirection};
use thiserror::Error;

/// Peer manager errors
#[derive(Debug, Error)]
pub enum PeerManagerError {
    /// Malformed envelope or sub-payload
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// No block at the requested height
    #[error("Block not found at height {height}")]
    BlockNotFound { height: u64 },

    /// No finality signature at the requested height
    #[error("Block signature not found at height {height}")]
    SignatureNotFound { height: u64 },

    /// No IBTP record with the requested id
    #[error("IBTP {id} ({direction}) not found")]
    IbtpNotFound { id: String, direction: IbtpDirection },

    /// A capability is disabled or not ready
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Signing or signature combination failed
    #[error("Crypto failure: {0}")]
    Crypto(String),

    /// Send or broadcast failed
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A master check for this address is already running locally
    #[error("Master check already in progress for gateway {address}")]
    ElectionInProgress { address: String },
}

/// Coarse error class, used as a log field and metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Decode,
    NotFound,
    CapabilityUnavailable,
    CryptoFailure,
    TransportFailure,
    Election,
}

impl ErrorClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Decode => "decode",
            ErrorClass::NotFound => "not_found",
            ErrorClass::CapabilityUnavailable => "capability_unavailable",
            ErrorClass::CryptoFailure => "crypto_failure",
            ErrorClass::TransportFailure => "transport_failure",
            ErrorClass::Election => "election",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PeerManagerError {
    /// Class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            PeerManagerError::Decode(_) => ErrorClass::Decode,
            PeerManagerError::BlockNotFound { .. }
            | PeerManagerError::SignatureNotFound { .. }
            | PeerManagerError::IbtpNotFound { .. } => ErrorClass::NotFound,
            PeerManagerError::CapabilityUnavailable(_) => ErrorClass::CapabilityUnavailable,
            PeerManagerError::Crypto(_) => ErrorClass::CryptoFailure,
            PeerManagerError::Transport(_) => ErrorClass::TransportFailure,
            PeerManagerError::ElectionInProgress { .. } => ErrorClass::Election,
        }
    }
}

/// Result type for peer manager operations
pub type PeerResult<T> = Result<T, PeerManagerError>;
