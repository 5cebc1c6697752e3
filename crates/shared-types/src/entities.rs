//! # Core Entities
//!
//! Chain and network entities referenced by peer messages.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `IbtpRecord`
//! - **Networking**: `PeerId`, `InboundStream`, `GatewayAddress`

use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Block height in the chain.
    pub number: u64,
    /// Hash of this block.
    pub block_hash: Hash,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Merkle root of the transactions in the block.
    pub tx_root: Hash,
    /// Unix timestamp (milliseconds) when the block was proposed.
    pub timestamp: u64,
}

/// A block as served to syncing peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Encoded transactions. Empty when the body was not requested.
    pub transactions: Vec<Vec<u8>>,
}

impl Block {
    /// Height of this block.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Copy of this block without its body.
    #[must_use]
    pub fn without_body(&self) -> Block {
        Block {
            header: self.header.clone(),
            transactions: Vec::new(),
        }
    }
}

/// Direction of an inter-blockchain transfer artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IbtpDirection {
    /// The outbound request leg.
    Request,
    /// The receipt leg travelling back to the source chain.
    Response,
}

impl IbtpDirection {
    /// Single byte used when hashing the direction into an artifact digest.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            IbtpDirection::Request => 0,
            IbtpDirection::Response => 1,
        }
    }
}

impl std::fmt::Display for IbtpDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IbtpDirection::Request => f.write_str("request"),
            IbtpDirection::Response => f.write_str("response"),
        }
    }
}

/// A cross-chain transfer record requiring endorsement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbtpRecord {
    /// Transfer identifier (`from-to-index`).
    pub id: String,
    /// Which leg of the transfer this record is.
    pub direction: IbtpDirection,
    /// Hash of the record content as committed on chain.
    pub content_hash: Hash,
}

// =============================================================================
// CLUSTER B: NETWORKING
// =============================================================================

/// Identity of a peer connection on the transport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PeerId(pub String);

impl PeerId {
    /// Create a peer id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An inbound stream a frame arrived on. Replies go back on the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InboundStream {
    /// Transport-assigned stream identifier.
    pub id: u64,
    /// Peer on the other end of the stream.
    pub remote_peer: PeerId,
}

impl InboundStream {
    pub fn new(id: u64, remote_peer: PeerId) -> Self {
        Self { id, remote_peer }
    }
}

/// Opaque identifier of one external gateway identity.
pub type GatewayAddress = String;
