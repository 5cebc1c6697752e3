//! Gateway master election: initiator, responder and ack routing.
//!
//! The directory and the pending checks share one lock, so answering a
//! query, recording a master and resolving a check never interleave.

use async_trait::async_trait;
use shared_bus::PeerEvent;
use shared_types::{
    Envelope, GatewayAddress, InboundStream, MasterCheckResponse, MasterStatus, MessageKind,
    PeerId,
};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PeerMessagingService;
use crate::domain::{
    resolve_election, ElectionOutcome, ElectionState, GatewayDirectory, MasterClaim,
};
use crate::error::{PeerManagerError, PeerResult};
use crate::ports::inbound::GatewayElectionApi;
use crate::ports::outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSigner};

/// A local master check awaiting acks.
struct PendingCheck {
    /// Local gateway instance claiming the address.
    candidate: PeerId,
    acks: mpsc::UnboundedSender<MasterClaim>,
    /// Nodes whose own check for the address reached us meanwhile.
    competitors: HashSet<PeerId>,
}

#[derive(Default)]
pub(super) struct ElectionBook {
    directory: GatewayDirectory,
    pending: HashMap<GatewayAddress, PendingCheck>,
}

impl ElectionBook {
    /// Master to report to `querier`, or `None` to stay silent.
    ///
    /// An in-flight local claim wins over the directory. Only local
    /// instances are ever reported; an adopted remote master is not.
    fn answer_check(&mut self, address: &str, querier: &PeerId) -> Option<PeerId> {
        if let Some(check) = self.pending.get_mut(address) {
            check.competitors.insert(querier.clone());
            return Some(check.candidate.clone());
        }
        if !self.directory.contains(address) {
            return None;
        }
        self.directory.live_master(address)
    }

    fn state(&self, address: &str) -> ElectionState {
        if self.pending.contains_key(address) {
            ElectionState::Pending
        } else {
            self.directory.state(address)
        }
    }
}

impl<N, L, T, I> PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork + 'static,
    L: Ledger + 'static,
    T: ThresholdSigner + 'static,
    I: NodeIdentity + 'static,
{
    /// Answer a `CHECK_MASTER_PIER` query. Silence when there is no master
    /// to report.
    pub(super) async fn handle_check_master(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let address = envelope.payload_str()?.to_string();
        let querier = self.network.remote_peer_id(stream);

        let answer = self.election.lock().answer_check(&address, &querier);
        let Some(master) = answer else {
            debug!(gateway = %address, peer = %querier, "No master on file, staying silent");
            return Ok(());
        };

        let response = MasterCheckResponse {
            address,
            status: MasterStatus::HasMaster,
            master: Some(master),
        };
        let ack = Envelope::with_body(MessageKind::CheckMasterPierAck, &response)?;
        self.network.send_to_peer(&querier, ack).await
    }

    /// Route a `CHECK_MASTER_PIER_ACK` to the pending check for its address.
    pub(super) async fn handle_check_master_ack(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let response: MasterCheckResponse = envelope.body()?;
        let responder = self.network.remote_peer_id(stream);

        let master = match (response.status, response.master) {
            (MasterStatus::HasMaster, Some(master)) => master,
            (MasterStatus::HasMaster, None) => {
                warn!(gateway = %response.address, peer = %responder, "HAS_MASTER ack without a master");
                return Ok(());
            }
            (MasterStatus::NoMaster, _) => return Ok(()),
        };

        let delivered = self
            .election
            .lock()
            .pending
            .get(&response.address)
            .is_some_and(|check| check.acks.send(MasterClaim { responder, master }).is_ok());

        if !delivered {
            debug!(gateway = %response.address, "Master ack with no pending check, dropped");
            node_telemetry::metric_inc!(node_telemetry::MESSAGES_DROPPED, &["unsolicited"]);
        }
        Ok(())
    }
}

#[async_trait]
impl<N, L, T, I> GatewayElectionApi for PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork + 'static,
    L: Ledger + 'static,
    T: ThresholdSigner + 'static,
    I: NodeIdentity + 'static,
{
    async fn check_master(
        &self,
        address: &str,
        candidate: PeerId,
        deadline: Duration,
    ) -> PeerResult<ElectionOutcome> {
        let (acks, mut rx) = mpsc::unbounded_channel();
        {
            let mut book = self.election.lock();
            if book.pending.contains_key(address) {
                return Err(PeerManagerError::ElectionInProgress {
                    address: address.to_string(),
                });
            }
            book.directory.register(address, candidate.clone());
            book.pending.insert(
                address.to_string(),
                PendingCheck {
                    candidate: candidate.clone(),
                    acks,
                    competitors: HashSet::new(),
                },
            );
        }

        let query = Envelope::new(MessageKind::CheckMasterPier, address.as_bytes());
        if let Err(e) = self.network.broadcast(query).await {
            self.election.lock().pending.remove(address);
            node_telemetry::metric_inc!(node_telemetry::ELECTIONS, &["failed"]);
            return Err(e);
        }

        let mut claims = Vec::new();
        let expiry = tokio::time::sleep(deadline);
        tokio::pin!(expiry);
        loop {
            tokio::select! {
                _ = &mut expiry => break,
                Some(claim) = rx.recv() => claims.push(claim),
            }
        }

        // Acks still queued past the deadline are discarded with the check.
        let outcome = {
            let mut book = self.election.lock();
            let competitors = book
                .pending
                .remove(address)
                .map(|check| check.competitors)
                .unwrap_or_default();
            let outcome = resolve_election(&candidate, &claims, &competitors);
            book.directory.record_outcome(address, outcome.master.clone());
            outcome
        };

        let label = if outcome.self_elected {
            "self_elected"
        } else {
            "remote_master"
        };
        node_telemetry::metric_inc!(node_telemetry::ELECTIONS, &[label]);
        info!(
            gateway = %address,
            master = %outcome.master,
            self_elected = outcome.self_elected,
            claims = claims.len(),
            "Gateway master resolved"
        );

        self.bus
            .publish(PeerEvent::MasterResolved {
                address: address.to_string(),
                master: outcome.master.clone(),
                self_elected: outcome.self_elected,
            })
            .await;

        Ok(outcome)
    }

    fn register_gateway(&self, address: &str, peer: PeerId) {
        if self.election.lock().directory.register(address, peer.clone()) {
            debug!(gateway = %address, %peer, "Gateway instance registered");
        }
    }

    fn remove_gateway(&self, address: &str, peer: &PeerId) {
        if self.election.lock().directory.remove(address, peer) {
            debug!(gateway = %address, %peer, "Gateway instance removed");
        }
    }

    fn election_state(&self, address: &str) -> ElectionState {
        self.election.lock().state(address)
    }
}
