//! # Message Payloads
//!
//! Per-kind payload shapes carried inside an [`Envelope`](crate::Envelope).
//!
//! | Kind | Payload |
//! |------|---------|
//! | `GET_BLOCK`, `FETCH_BLOCK_SIGN` | decimal height as UTF-8 text |
//! | `GET_BLOCK_HEADERS`, `GET_BLOCKS` | [`BlockRangeRequest`] |
//! | `FETCH_IBTP_*_SIGN` | IBTP id as UTF-8 text |
//! | `FETCH_IBTP_*_TSS_SIGN`, `TSS_KEYSIGN_NOT_PARTIES` | [`SignRequest`] or [`LegacySignRequest`] |
//! | `CHECK_MASTER_PIER` | gateway address as UTF-8 text |
//! | `CHECK_MASTER_PIER_ACK` | [`MasterCheckResponse`] |

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::codec;
use crate::entities::{Block, BlockHeader, GatewayAddress, IbtpDirection, PeerId};
use crate::errors::CodecError;

/// Fixed body of `TSS_KEYSIGN_NOT_PARTIES_ACK`.
pub const NOT_PARTIES_ACK_PAYLOAD: &[u8] = b"ok";

/// Parse a decimal, unsigned block height.
pub fn parse_height(payload: &[u8]) -> Result<u64, CodecError> {
    let text = std::str::from_utf8(payload).map_err(|e| CodecError::InvalidHeight {
        input: hex::encode(payload),
        reason: e.to_string(),
    })?;
    text.parse::<u64>().map_err(|e| CodecError::InvalidHeight {
        input: text.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// BLOCK SYNC
// =============================================================================

/// Inclusive height range for header and block range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRangeRequest {
    pub start: u64,
    pub end: u64,
}

impl BlockRangeRequest {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Heights covered by this request, ascending. Empty when `start > end`.
    #[must_use]
    pub fn heights(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

/// Body of `GET_BLOCK_HEADERS_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeadersResponse {
    pub headers: Vec<BlockHeader>,
}

/// Body of `GET_BLOCKS_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlocksResponse {
    pub blocks: Vec<Block>,
}

// =============================================================================
// CREDENTIAL EXCHANGE
// =============================================================================

/// Body of `FETCH_CERT_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertsMessage {
    pub agency_cert: Vec<u8>,
    pub node_cert: Vec<u8>,
}

/// Body of `FETCH_TSS_PUBKEY_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssPublicKey {
    /// Address derived from the aggregate key.
    pub address: String,
    /// Aggregate public key bytes.
    pub public_key: Vec<u8>,
}

/// One keygen participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssParticipant {
    pub party_id: String,
    pub public_key: Vec<u8>,
}

/// Body of `FETCH_TSS_INFO_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssInfo {
    /// Minimum number of cooperating parties.
    pub threshold: u32,
    /// Parties that took part in key generation.
    pub participants: Vec<TssParticipant>,
}

// =============================================================================
// SIGNATURE COORDINATION
// =============================================================================

/// A signature produced by the signature coordination layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedArtifact {
    pub signer_address: String,
    pub signature: Vec<u8>,
    /// Participants the TSS ceremony flagged as misbehaving. Empty otherwise.
    pub culprits: Vec<String>,
}

impl SignedArtifact {
    /// Artifact carrying a plain signature and no culprits.
    pub fn plain(signer_address: impl Into<String>, signature: Vec<u8>) -> Self {
        Self {
            signer_address: signer_address.into(),
            signature,
            culprits: Vec::new(),
        }
    }
}

/// Artifact class a [`SignRequest`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignRequestKind {
    IbtpRequest,
    IbtpResponse,
}

impl SignRequestKind {
    #[must_use]
    pub fn direction(self) -> IbtpDirection {
        match self {
            SignRequestKind::IbtpRequest => IbtpDirection::Request,
            SignRequestKind::IbtpResponse => IbtpDirection::Response,
        }
    }
}

/// Session parameters of a TSS sign request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SignExtra {
    /// Parties asked to take part in the ceremony, in order.
    pub participants: Vec<String>,
    /// Per-ceremony tag distinguishing sessions over the same artifact.
    pub artifact_tag: String,
    /// Parties reported as not responding. Only set on non-participation notices.
    pub non_participants: Vec<String>,
}

impl SignExtra {
    /// Parse the legacy compound form emitted by older peers.
    ///
    /// Hyphen-separated tokens: comma list of participants, the artifact tag,
    /// and optionally a comma list of non-participants.
    pub fn parse_compact(compact: &str) -> Result<Self, CodecError> {
        let tokens: Vec<&str> = compact.split('-').collect();
        if tokens.len() < 2 || tokens.len() > 3 {
            return Err(CodecError::MalformedExtra(compact.to_string()));
        }

        let split_list = |token: &str| -> Vec<String> {
            token
                .split(',')
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        };

        Ok(Self {
            participants: split_list(tokens[0]),
            artifact_tag: tokens[1].to_string(),
            non_participants: tokens.get(2).map(|t| split_list(*t)).unwrap_or_default(),
        })
    }
}

/// Body of TSS sign requests and non-participation notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub kind: SignRequestKind,
    /// Artifact identifier (the IBTP id).
    pub content: String,
    pub extra: SignExtra,
}

impl SignRequest {
    /// Decode a sign request body, falling back to the legacy shape with a
    /// compound `extra` string.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let structured_err = match codec::decode::<SignRequest>(payload) {
            Ok(request) => return Ok(request),
            Err(e) => e,
        };
        let legacy: LegacySignRequest = codec::decode(payload).map_err(|_| structured_err)?;
        legacy.try_into()
    }
}

/// Sign request as sent by older peers, `extra` in the compound form read by
/// [`SignExtra::parse_compact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySignRequest {
    pub kind: SignRequestKind,
    pub content: String,
    pub extra: String,
}

impl TryFrom<LegacySignRequest> for SignRequest {
    type Error = CodecError;

    fn try_from(legacy: LegacySignRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: legacy.kind,
            extra: SignExtra::parse_compact(&legacy.extra)?,
            content: legacy.content,
        })
    }
}

// =============================================================================
// GATEWAY MASTER ELECTION
// =============================================================================

/// Answer status of a master check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasterStatus {
    HasMaster,
    NoMaster,
}

/// Body of `CHECK_MASTER_PIER_ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterCheckResponse {
    pub address: GatewayAddress,
    pub status: MasterStatus,
    /// Peer the responder believes holds the master, itself for in-flight claims.
    pub master: Option<PeerId>,
}
