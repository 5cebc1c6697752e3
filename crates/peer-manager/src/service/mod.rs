//! # Peer Messaging Service
//!
//! Dispatches every inbound frame to its handler and implements the gateway
//! master election.
//!
//! ## Dispatch Model
//!
//! Each frame gets its own tokio task, so the transport's read loop never
//! waits on a handler. There is no ordering between tasks, not even between
//! two frames of the same kind from the same peer. A handler error is logged
//! with its kind and class and affects only that frame.
//!
//! | Handling | Kinds |
//! |----------|-------|
//! | Reply path | block sync, `FETCH_CERT`, `FETCH_P2P_PUBKEY`, `CHECK_MASTER_PIER(_ACK)` |
//! | Detached | TSS key fetches, signature requests, non-participation notices, forwarded kinds |
//! | Ignored | unknown kinds and acks arriving unsolicited |
//!
//! Reply-path kinds finish inside the frame's task. Detached kinds move to a
//! second task so that the frame's [`JoinHandle`] resolves as soon as they
//! are started.
//!
//! Handlers share `max_in_flight` permits, except master election traffic.
//! A check's acks must land before its deadline even while TSS ceremonies
//! hold every permit.

mod election;
mod responders;
mod signing;


use parking_lot::Mutex;
use shared_bus::EventPublisher;
use shared_types::{Envelope, InboundStream, MessageKind};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::PeerManagerConfig;
use crate::domain::SessionRegistry;
use crate::error::PeerResult;
use crate::ports::inbound::FrameDispatcher;
use crate::ports::outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSigner};

use election::ElectionBook;

/// How the dispatcher runs a message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// Handled inside the frame's task; at most one reply on the stream.
    ReplyPath,
    /// Handed to an independent task.
    Detached,
    /// Logged and dropped.
    Ignored,
}

/// Handling for `kind`.
#[must_use]
pub fn handling_for(kind: MessageKind) -> Handling {
    match kind {
        MessageKind::GetBlock
        | MessageKind::GetBlockHeaders
        | MessageKind::GetBlocks
        | MessageKind::FetchCert
        | MessageKind::FetchP2pPubkey
        | MessageKind::CheckMasterPier
        | MessageKind::CheckMasterPierAck => Handling::ReplyPath,

        MessageKind::FetchTssPubkey
        | MessageKind::FetchTssInfo
        | MessageKind::FetchBlockSign
        | MessageKind::FetchIbtpRequestSign
        | MessageKind::FetchIbtpResponseSign
        | MessageKind::FetchIbtpRequestTssSign
        | MessageKind::FetchIbtpResponseTssSign
        | MessageKind::TssKeysignNotParties
        | MessageKind::Consensus
        | MessageKind::TssTask
        | MessageKind::FetchTssNodes
        | MessageKind::TssCulprits
        | MessageKind::FetchIbtpTssSignAck => Handling::Detached,

        MessageKind::GetBlockAck
        | MessageKind::GetBlockHeadersAck
        | MessageKind::GetBlocksAck
        | MessageKind::FetchCertAck
        | MessageKind::FetchP2pPubkeyAck
        | MessageKind::FetchTssPubkeyAck
        | MessageKind::FetchTssInfoAck
        | MessageKind::FetchBlockSignAck
        | MessageKind::FetchIbtpSignAck
        | MessageKind::TssKeysignNotPartiesAck
        | MessageKind::Unknown(_) => Handling::Ignored,
    }
}

/// Whether `kind` runs outside the in-flight limit.
fn bypasses_in_flight_limit(kind: MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::CheckMasterPier | MessageKind::CheckMasterPierAck
    )
}

/// Peer Messaging Service.
///
/// Cheap to clone; clones share all state.
///
/// ## Dependencies
///
/// - `N: PeerNetwork` - replies and broadcasts
/// - `L: Ledger` - block, signature and IBTP lookups
/// - `T: ThresholdSigner` - TSS ceremonies
/// - `I: NodeIdentity` - certificates and the node's own signing key
pub struct PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork,
    L: Ledger,
    T: ThresholdSigner,
    I: NodeIdentity,
{
    config: Arc<PeerManagerConfig>,
    network: Arc<N>,
    ledger: Arc<L>,
    signer: Arc<T>,
    identity: Arc<I>,
    /// Sink for forwarded kinds and election outcomes.
    bus: Arc<dyn EventPublisher>,
    /// Gateway directory and pending checks, behind one lock.
    election: Arc<Mutex<ElectionBook>>,
    sessions: Arc<Mutex<SessionRegistry>>,
    in_flight: Arc<Semaphore>,
}

impl<N, L, T, I> Clone for PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork,
    L: Ledger,
    T: ThresholdSigner,
    I: NodeIdentity,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            network: Arc::clone(&self.network),
            ledger: Arc::clone(&self.ledger),
            signer: Arc::clone(&self.signer),
            identity: Arc::clone(&self.identity),
            bus: Arc::clone(&self.bus),
            election: Arc::clone(&self.election),
            sessions: Arc::clone(&self.sessions),
            in_flight: Arc::clone(&self.in_flight),
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
    pub fn new(
        config: PeerManagerConfig,
        network: Arc<N>,
        ledger: Arc<L>,
        signer: Arc<T>,
        identity: Arc<I>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let in_flight = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        let sessions = SessionRegistry::new(config.session_ttl());
        Self {
            config: Arc::new(config),
            network,
            ledger,
            signer,
            identity,
            bus,
            election: Arc::new(Mutex::new(ElectionBook::default())),
            sessions: Arc::new(Mutex::new(sessions)),
            in_flight,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PeerManagerConfig {
        &self.config
    }

    /// Open TSS sessions holding exclusions.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    async fn process_frame(self, stream: InboundStream, frame: Vec<u8>) {
        let envelope = match Envelope::from_bytes(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(peer = %stream.remote_peer, error = %e, "Dropping undecodable frame");
                node_telemetry::metric_inc!(node_telemetry::MESSAGES_DROPPED, &["decode"]);
                return;
            }
        };

        let kind = envelope.kind;
        node_telemetry::metric_inc!(node_telemetry::MESSAGES_RECEIVED, &[kind.as_str()]);

        match handling_for(kind) {
            Handling::ReplyPath => self.execute(stream, envelope).await,
            Handling::Detached => {
                tokio::spawn(async move { self.execute(stream, envelope).await });
            }
            Handling::Ignored => {
                let reason = match kind {
                    MessageKind::Unknown(_) => "unknown_kind",
                    _ => "unsolicited",
                };
                debug!(kind = %kind, peer = %stream.remote_peer, "Ignoring message with no handler");
                node_telemetry::metric_inc!(node_telemetry::MESSAGES_DROPPED, &[reason]);
            }
        }
    }

    /// Run one handler under the in-flight limit and log its failure.
    async fn execute(&self, stream: InboundStream, envelope: Envelope) {
        let kind = envelope.kind;
        let _permit = if bypasses_in_flight_limit(kind) {
            None
        } else {
            match self.in_flight.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => return,
            }
        };
        let _in_flight = InFlightGuard::enter();

        let timer = node_telemetry::HANDLER_DURATION
            .with_label_values(&[kind.as_str()])
            .start_timer();

        if kind != MessageKind::Consensus {
            debug!(kind = %kind, peer = %stream.remote_peer, "Handling peer message");
        }

        if let Err(e) = self.handle(&stream, envelope).await {
            let class = e.class();
            node_telemetry::metric_inc!(
                node_telemetry::HANDLER_FAILURES,
                &[kind.as_str(), class.as_str()]
            );
            error!(
                kind = %kind,
                class = %class,
                peer = %stream.remote_peer,
                error = %e,
                "Peer message handler failed"
            );
        }

        timer.observe_duration();
    }

    async fn handle(&self, stream: &InboundStream, envelope: Envelope) -> PeerResult<()> {
        match envelope.kind {
            // Block sync
            MessageKind::GetBlock => self.handle_get_block(stream, &envelope).await,
            MessageKind::GetBlockHeaders => self.handle_get_block_headers(stream, &envelope).await,
            MessageKind::GetBlocks => self.handle_get_blocks(stream, &envelope).await,

            // Credentials
            MessageKind::FetchCert => self.handle_fetch_cert(stream).await,
            MessageKind::FetchP2pPubkey => self.handle_fetch_p2p_pubkey(stream).await,
            MessageKind::FetchTssPubkey => self.handle_fetch_tss_pubkey(stream).await,
            MessageKind::FetchTssInfo => self.handle_fetch_tss_info(stream).await,

            // Signatures
            MessageKind::FetchBlockSign => self.handle_fetch_block_sign(stream, &envelope).await,
            MessageKind::FetchIbtpRequestSign | MessageKind::FetchIbtpResponseSign => {
                self.handle_fetch_ibtp_sign(stream, &envelope).await
            }
            MessageKind::FetchIbtpRequestTssSign | MessageKind::FetchIbtpResponseTssSign => {
                self.handle_fetch_ibtp_tss_sign(&envelope).await
            }
            MessageKind::TssKeysignNotParties => self.handle_not_parties(stream, &envelope).await,

            // Forwarded into the node
            MessageKind::Consensus
            | MessageKind::TssTask
            | MessageKind::FetchTssNodes
            | MessageKind::TssCulprits
            | MessageKind::FetchIbtpTssSignAck => self.forward(stream, envelope).await,

            // Gateway master election
            MessageKind::CheckMasterPier => self.handle_check_master(stream, &envelope).await,
            MessageKind::CheckMasterPierAck => {
                self.handle_check_master_ack(stream, &envelope).await
            }

            kind => {
                debug!(kind = %kind, "No handler for message kind");
                Ok(())
            }
        }
    }
}

impl<N, L, T, I> FrameDispatcher for PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork + 'static,
    L: Ledger + 'static,
    T: ThresholdSigner + 'static,
    I: NodeIdentity + 'static,
{
    fn dispatch(&self, stream: InboundStream, frame: Vec<u8>) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(service.process_frame(stream, frame))
    }
}

/// Keeps the in-flight gauge right even if a handler panics.
struct InFlightGuard;

impl InFlightGuard {
    fn enter() -> Self {
        node_telemetry::HANDLERS_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        node_telemetry::HANDLERS_IN_FLIGHT.dec();
    }
}
