//! Ports layer (hexagonal architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::{FrameDispatcher, GatewayElectionApi};
pub use outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSigner};
