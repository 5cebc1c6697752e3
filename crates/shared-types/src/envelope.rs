//! # Peer Message Envelope
//!
//! The outer wrapper for every frame exchanged between relay nodes.
//!
//! The kind travels on the wire as a bare `u32` code so that a node running an
//! older build can still decode frames carrying kinds it does not know; those
//! surface as [`MessageKind::Unknown`] and are dropped by the dispatcher.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::errors::CodecError;

/// Every message kind understood by the peer control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum MessageKind {
    // =========================================================================
    // BLOCK SYNC
    // =========================================================================
    GetBlock,
    GetBlockAck,
    GetBlockHeaders,
    GetBlockHeadersAck,
    GetBlocks,
    GetBlocksAck,

    // =========================================================================
    // CREDENTIAL EXCHANGE
    // =========================================================================
    FetchCert,
    FetchCertAck,
    FetchP2pPubkey,
    FetchP2pPubkeyAck,
    FetchTssPubkey,
    FetchTssPubkeyAck,
    FetchTssInfo,
    FetchTssInfoAck,

    // =========================================================================
    // SIGNATURE COORDINATION
    // =========================================================================
    FetchBlockSign,
    FetchBlockSignAck,
    FetchIbtpRequestSign,
    FetchIbtpResponseSign,
    FetchIbtpSignAck,
    FetchIbtpRequestTssSign,
    FetchIbtpResponseTssSign,
    FetchIbtpTssSignAck,
    TssKeysignNotParties,
    TssKeysignNotPartiesAck,
    TssTask,
    FetchTssNodes,
    TssCulprits,

    // =========================================================================
    // CONSENSUS FORWARDING
    // =========================================================================
    Consensus,

    // =========================================================================
    // GATEWAY MASTER ELECTION
    // =========================================================================
    CheckMasterPier,
    CheckMasterPierAck,

    /// A kind code this build does not recognise.
    Unknown(u32),
}

impl MessageKind {
    /// Wire code of this kind.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            MessageKind::GetBlock => 1,
            MessageKind::GetBlockAck => 2,
            MessageKind::GetBlockHeaders => 3,
            MessageKind::GetBlockHeadersAck => 4,
            MessageKind::GetBlocks => 5,
            MessageKind::GetBlocksAck => 6,
            MessageKind::FetchCert => 10,
            MessageKind::FetchCertAck => 11,
            MessageKind::FetchP2pPubkey => 12,
            MessageKind::FetchP2pPubkeyAck => 13,
            MessageKind::FetchTssPubkey => 14,
            MessageKind::FetchTssPubkeyAck => 15,
            MessageKind::FetchTssInfo => 16,
            MessageKind::FetchTssInfoAck => 17,
            MessageKind::FetchBlockSign => 20,
            MessageKind::FetchBlockSignAck => 21,
            MessageKind::FetchIbtpRequestSign => 22,
            MessageKind::FetchIbtpResponseSign => 23,
            MessageKind::FetchIbtpSignAck => 24,
            MessageKind::FetchIbtpRequestTssSign => 25,
            MessageKind::FetchIbtpResponseTssSign => 26,
            MessageKind::FetchIbtpTssSignAck => 27,
            MessageKind::TssKeysignNotParties => 28,
            MessageKind::TssKeysignNotPartiesAck => 29,
            MessageKind::TssTask => 30,
            MessageKind::FetchTssNodes => 31,
            MessageKind::TssCulprits => 32,
            MessageKind::Consensus => 40,
            MessageKind::CheckMasterPier => 50,
            MessageKind::CheckMasterPierAck => 51,
            MessageKind::Unknown(code) => code,
        }
    }

    /// Kind for a wire code. Unassigned codes map to `Unknown`.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => MessageKind::GetBlock,
            2 => MessageKind::GetBlockAck,
            3 => MessageKind::GetBlockHeaders,
            4 => MessageKind::GetBlockHeadersAck,
            5 => MessageKind::GetBlocks,
            6 => MessageKind::GetBlocksAck,
            10 => MessageKind::FetchCert,
            11 => MessageKind::FetchCertAck,
            12 => MessageKind::FetchP2pPubkey,
            13 => MessageKind::FetchP2pPubkeyAck,
            14 => MessageKind::FetchTssPubkey,
            15 => MessageKind::FetchTssPubkeyAck,
            16 => MessageKind::FetchTssInfo,
            17 => MessageKind::FetchTssInfoAck,
            20 => MessageKind::FetchBlockSign,
            21 => MessageKind::FetchBlockSignAck,
            22 => MessageKind::FetchIbtpRequestSign,
            23 => MessageKind::FetchIbtpResponseSign,
            24 => MessageKind::FetchIbtpSignAck,
            25 => MessageKind::FetchIbtpRequestTssSign,
            26 => MessageKind::FetchIbtpResponseTssSign,
            27 => MessageKind::FetchIbtpTssSignAck,
            28 => MessageKind::TssKeysignNotParties,
            29 => MessageKind::TssKeysignNotPartiesAck,
            30 => MessageKind::TssTask,
            31 => MessageKind::FetchTssNodes,
            32 => MessageKind::TssCulprits,
            40 => MessageKind::Consensus,
            50 => MessageKind::CheckMasterPier,
            51 => MessageKind::CheckMasterPierAck,
            other => MessageKind::Unknown(other),
        }
    }

    /// Stable name used in logs and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::GetBlock => "GET_BLOCK",
            MessageKind::GetBlockAck => "GET_BLOCK_ACK",
            MessageKind::GetBlockHeaders => "GET_BLOCK_HEADERS",
            MessageKind::GetBlockHeadersAck => "GET_BLOCK_HEADERS_ACK",
            MessageKind::GetBlocks => "GET_BLOCKS",
            MessageKind::GetBlocksAck => "GET_BLOCKS_ACK",
            MessageKind::FetchCert => "FETCH_CERT",
            MessageKind::FetchCertAck => "FETCH_CERT_ACK",
            MessageKind::FetchP2pPubkey => "FETCH_P2P_PUBKEY",
            MessageKind::FetchP2pPubkeyAck => "FETCH_P2P_PUBKEY_ACK",
            MessageKind::FetchTssPubkey => "FETCH_TSS_PUBKEY",
            MessageKind::FetchTssPubkeyAck => "FETCH_TSS_PUBKEY_ACK",
            MessageKind::FetchTssInfo => "FETCH_TSS_INFO",
            MessageKind::FetchTssInfoAck => "FETCH_TSS_INFO_ACK",
            MessageKind::FetchBlockSign => "FETCH_BLOCK_SIGN",
            MessageKind::FetchBlockSignAck => "FETCH_BLOCK_SIGN_ACK",
            MessageKind::FetchIbtpRequestSign => "FETCH_IBTP_REQUEST_SIGN",
            MessageKind::FetchIbtpResponseSign => "FETCH_IBTP_RESPONSE_SIGN",
            MessageKind::FetchIbtpSignAck => "FETCH_IBTP_SIGN_ACK",
            MessageKind::FetchIbtpRequestTssSign => "FETCH_IBTP_REQUEST_TSS_SIGN",
            MessageKind::FetchIbtpResponseTssSign => "FETCH_IBTP_RESPONSE_TSS_SIGN",
            MessageKind::FetchIbtpTssSignAck => "FETCH_IBTP_TSS_SIGN_ACK",
            MessageKind::TssKeysignNotParties => "TSS_KEYSIGN_NOT_PARTIES",
            MessageKind::TssKeysignNotPartiesAck => "TSS_KEYSIGN_NOT_PARTIES_ACK",
            MessageKind::TssTask => "TSS_TASK",
            MessageKind::FetchTssNodes => "FETCH_TSS_NODES",
            MessageKind::TssCulprits => "TSS_CULPRITS",
            MessageKind::Consensus => "CONSENSUS",
            MessageKind::CheckMasterPier => "CHECK_MASTER_PIER",
            MessageKind::CheckMasterPierAck => "CHECK_MASTER_PIER_ACK",
            MessageKind::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u32> for MessageKind {
    fn from(code: u32) -> Self {
        MessageKind::from_code(code)
    }
}

impl From<MessageKind> for u32 {
    fn from(kind: MessageKind) -> Self {
        kind.code()
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Unknown(code) => write!(f, "UNKNOWN({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The wire envelope: a kind plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Determines how `payload` is interpreted.
    pub kind: MessageKind,
    /// Kind-specific payload bytes.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Create an envelope from a kind and raw payload.
    pub fn new(kind: MessageKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create an envelope whose payload is the encoded `body`.
    pub fn with_body<T: Serialize>(kind: MessageKind, body: &T) -> Result<Self, CodecError> {
        Ok(Self::new(kind, codec::encode(body)?))
    }

    /// Decode the payload as `T`.
    pub fn body<T: serde::de::DeserializeOwned>(&self) -> Result<T, CodecError> {
        codec::decode(&self.payload)
    }

    /// Interpret the payload as a UTF-8 string.
    pub fn payload_str(&self) -> Result<&str, CodecError> {
        std::str::from_utf8(&self.payload).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
    }

    /// Serialize the whole envelope into a frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }

    /// Parse a frame into an envelope.
    pub fn from_bytes(frame: &[u8]) -> Result<Self, CodecError> {
        codec::decode(frame)
    }
}
