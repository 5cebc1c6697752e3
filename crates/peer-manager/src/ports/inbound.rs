//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::{InboundStream, PeerId};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::{ElectionOutcome, ElectionState};
use crate::error::PeerResult;

/// Entry point for raw frames read off the transport.
pub trait FrameDispatcher: Send + Sync {
    /// Hand one frame to its own task and return immediately.
    ///
    /// Frames are handled concurrently with no ordering guarantee, even
    /// between two frames of the same kind from the same peer. The handle
    /// completes once reply-path handling is done; detached kinds may still
    /// be running on a task of their own.
    fn dispatch(&self, stream: InboundStream, frame: Vec<u8>) -> JoinHandle<()>;
}

/// Gateway master election.
#[async_trait]
pub trait GatewayElectionApi: Send + Sync {
    /// Ask the peer set who is master of `address`.
    ///
    /// Registers `candidate` (the local gateway instance) for the address,
    /// broadcasts `CHECK_MASTER_PIER` and collects acks until `deadline`
    /// elapses. Fails with `ElectionInProgress` if a check for the address is
    /// already pending, or with a transport error if the broadcast fails.
    async fn check_master(
        &self,
        address: &str,
        candidate: PeerId,
        deadline: Duration,
    ) -> PeerResult<ElectionOutcome>;

    /// Record a gateway instance as connected for `address`.
    fn register_gateway(&self, address: &str, peer: PeerId);

    /// Forget a gateway instance. Clears the master if it was the master.
    fn remove_gateway(&self, address: &str, peer: &PeerId);

    /// Current local view of `address`.
    fn election_state(&self, address: &str) -> ElectionState;
}
