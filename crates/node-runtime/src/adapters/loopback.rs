//! # Loopback Transport
//!
//! In-process peer network. Every attached node owns a [`LoopbackNetwork`]
//! endpoint; sending encodes the envelope to a frame and hands it to the
//! receiving node's [`FrameDispatcher`] on a fresh stream.
//!
//! Each send opens a new stream, so a reply on a stream reaches the original
//! sender as a new inbound frame.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use peer_manager::{FrameDispatcher, PeerManagerError, PeerNetwork, PeerResult};
use shared_types::{Envelope, InboundStream, PeerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// A frame observed crossing the hub.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub from: PeerId,
    pub to: PeerId,
    pub envelope: Envelope,
}

/// Shared switchboard connecting loopback endpoints.
#[derive(Default)]
pub struct LoopbackHub {
    nodes: RwLock<HashMap<PeerId, Arc<dyn FrameDispatcher>>>,
    next_stream: AtomicU64,
    tap: Mutex<Option<mpsc::UnboundedSender<Delivery>>>,
}

impl LoopbackHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Network endpoint for `local`.
    pub fn endpoint(self: &Arc<Self>, local: PeerId) -> LoopbackNetwork {
        LoopbackNetwork {
            hub: Arc::clone(self),
            local,
        }
    }

    /// Route frames addressed to `peer` into `dispatcher`.
    pub fn attach(&self, peer: PeerId, dispatcher: Arc<dyn FrameDispatcher>) {
        self.nodes.write().insert(peer, dispatcher);
    }

    /// Disconnect `peer`. Later sends to it fail.
    pub fn detach(&self, peer: &PeerId) -> bool {
        self.nodes.write().remove(peer).is_some()
    }

    /// Copy of every delivered frame, from now on. Replaces any earlier tap.
    pub fn tap(&self) -> mpsc::UnboundedReceiver<Delivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tap.lock() = Some(tx);
        rx
    }

    /// Connected peers, sorted.
    pub fn peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<_> = self.nodes.read().keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Deliver `envelope` from `from` to `to` on a new stream.
    pub fn deliver(
        &self,
        from: &PeerId,
        to: &PeerId,
        envelope: Envelope,
    ) -> PeerResult<JoinHandle<()>> {
        let dispatcher = self
            .nodes
            .read()
            .get(to)
            .cloned()
            .ok_or_else(|| PeerManagerError::Transport(format!("peer {to} not connected")))?;

        let frame = envelope.to_bytes()?;
        let stream = InboundStream::new(self.next_stream.fetch_add(1, Ordering::Relaxed), from.clone());
        trace!(%from, %to, kind = %envelope.kind, stream = stream.id, "Loopback delivery");

        if let Some(tap) = self.tap.lock().as_ref() {
            let _ = tap.send(Delivery {
                from: from.clone(),
                to: to.clone(),
                envelope,
            });
        }

        Ok(dispatcher.dispatch(stream, frame))
    }
}

/// One node's view of the loopback hub.
#[derive(Clone)]
pub struct LoopbackNetwork {
    hub: Arc<LoopbackHub>,
    local: PeerId,
}

#[async_trait]
impl PeerNetwork for LoopbackNetwork {
    async fn send_on_stream(&self, stream: &InboundStream, envelope: Envelope) -> PeerResult<()> {
        self.hub
            .deliver(&self.local, &stream.remote_peer, envelope)
            .map(drop)
    }

    async fn send_to_peer(&self, peer: &PeerId, envelope: Envelope) -> PeerResult<()> {
        self.hub.deliver(&self.local, peer, envelope).map(drop)
    }

    async fn broadcast(&self, envelope: Envelope) -> PeerResult<()> {
        let mut first_error = None;
        for peer in self.hub.peers() {
            if peer == self.local {
                continue;
            }
            if let Err(e) = self.hub.deliver(&self.local, &peer, envelope.clone()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn local_peer_id(&self) -> PeerId {
        self.local.clone()
    }
}
