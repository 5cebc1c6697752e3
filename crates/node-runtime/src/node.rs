//! # Relay Node Assembly
//!
//! Wires a [`PeerMessagingService`] to the development adapters and attaches
//! it to a loopback hub.

use peer_manager::{PeerManagerConfig, PeerMessagingService, ThresholdSigner};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::PeerId;
use std::sync::Arc;
use tracing::info;

use crate::adapters::{Ed25519Identity, LoopbackHub, LoopbackNetwork, MemoryLedger, UnavailableTss};
use crate::config::{ConfigError, NodeConfig};

/// Peer messaging service over the development adapters.
pub type RelayService<T> = PeerMessagingService<LoopbackNetwork, MemoryLedger, T, Ed25519Identity>;

/// A running node attached to a loopback hub.
pub struct RelayNode<T: ThresholdSigner + 'static> {
    peer_id: PeerId,
    service: RelayService<T>,
    ledger: Arc<MemoryLedger>,
    identity: Arc<Ed25519Identity>,
    bus: Arc<InMemoryEventBus>,
    hub: Arc<LoopbackHub>,
}

impl<T: ThresholdSigner + 'static> RelayNode<T> {
    /// Build the service for `peer_id` and attach it to `hub`.
    pub fn spawn(
        hub: &Arc<LoopbackHub>,
        peer_id: PeerId,
        config: PeerManagerConfig,
        identity: Ed25519Identity,
        ledger: MemoryLedger,
        signer: T,
    ) -> Self {
        let ledger = Arc::new(ledger);
        let identity = Arc::new(identity);
        let bus = Arc::new(InMemoryEventBus::new());

        let service = PeerMessagingService::new(
            config,
            Arc::new(hub.endpoint(peer_id.clone())),
            Arc::clone(&ledger),
            Arc::new(signer),
            Arc::clone(&identity),
            bus.clone(),
        );
        hub.attach(peer_id.clone(), Arc::new(service.clone()));

        info!(peer = %peer_id, "Relay node attached");
        Self {
            peer_id,
            service,
            ledger,
            identity,
            bus,
            hub: Arc::clone(hub),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn service(&self) -> &RelayService<T> {
        &self.service
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn identity(&self) -> &Ed25519Identity {
        &self.identity
    }

    /// Subscribe to forwarded messages and election outcomes.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    /// Detach from the hub. Frames already dispatched still complete.
    pub fn shutdown(&self) {
        if self.hub.detach(&self.peer_id) {
            info!(peer = %self.peer_id, "Relay node detached");
        }
    }
}

impl RelayNode<UnavailableTss> {
    /// Node described by `config`, without a TSS key.
    pub fn from_config(
        hub: &Arc<LoopbackHub>,
        config: &NodeConfig,
        ledger: MemoryLedger,
    ) -> Result<Self, ConfigError> {
        let identity = Ed25519Identity::from_config(&config.identity)?;
        Ok(Self::spawn(
            hub,
            PeerId::new(config.identity.peer_id.clone()),
            config.peer.clone(),
            identity,
            ledger,
            UnavailableTss,
        ))
    }
}
