//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Capabilities the control plane consumes. Implementations live in
//! `node-runtime` (development adapters) or in the embedding node.

use async_trait::async_trait;
use shared_types::{
    Block, Envelope, Hash, IbtpDirection, IbtpRecord, InboundStream, PeerId, TssInfo,
    TssPublicKey,
};

use crate::error::PeerResult;

/// Peer transport.
///
/// Send failures are reported once and never retried by the caller.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Reply on the stream a request arrived on.
    async fn send_on_stream(&self, stream: &InboundStream, envelope: Envelope) -> PeerResult<()>;

    /// Send to one peer on a fresh stream.
    async fn send_to_peer(&self, peer: &PeerId, envelope: Envelope) -> PeerResult<()>;

    /// Send to every connected peer except this node.
    async fn broadcast(&self, envelope: Envelope) -> PeerResult<()>;

    /// Peer on the other end of `stream`.
    fn remote_peer_id(&self, stream: &InboundStream) -> PeerId {
        stream.remote_peer.clone()
    }

    /// This node's own peer id.
    fn local_peer_id(&self) -> PeerId;
}

/// Read-only chain lookups.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Block at `height`, with its transactions when `include_body` is set.
    async fn get_block(&self, height: u64, include_body: bool) -> PeerResult<Block>;

    /// Finality signature stored for the block at `height`.
    async fn get_block_signature(&self, height: u64) -> PeerResult<Vec<u8>>;

    /// One leg of a cross-chain transfer.
    async fn get_ibtp(&self, id: &str, direction: IbtpDirection) -> PeerResult<IbtpRecord>;
}

/// Output of a TSS signing ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSignature {
    pub signature: Vec<u8>,
    /// Participants the ceremony flagged as misbehaving.
    pub culprits: Vec<String>,
}

/// Threshold-signature capability.
///
/// Every method fails with `CapabilityUnavailable` while no key is ready.
#[async_trait]
pub trait ThresholdSigner: Send + Sync {
    /// Aggregate public key and its address.
    async fn public_key(&self) -> PeerResult<TssPublicKey>;

    /// Threshold and keygen participants.
    async fn participant_info(&self) -> PeerResult<TssInfo>;

    /// Run a signing ceremony over `digest` with `participants`.
    async fn sign_threshold(
        &self,
        digest: Hash,
        tag: &str,
        participants: &[String],
    ) -> PeerResult<ThresholdSignature>;

    /// Tell the ceremony for `digest`/`tag` that `non_participants` will not
    /// take part.
    async fn notify_non_participants(
        &self,
        digest: Hash,
        tag: &str,
        participants: &[String],
        non_participants: &[String],
    ) -> PeerResult<()>;
}

/// This node's own credentials and signing key.
pub trait NodeIdentity: Send + Sync {
    /// Address derived from the node's signing key.
    fn address(&self) -> String;

    fn agency_cert(&self) -> Vec<u8>;

    fn node_cert(&self) -> Vec<u8>;

    /// Public key the transport authenticates this node with.
    fn transport_public_key(&self) -> PeerResult<Vec<u8>>;

    /// Multisig endorsement: the node's own signature over `digest`.
    fn sign(&self, digest: &Hash) -> PeerResult<Vec<u8>>;
}
