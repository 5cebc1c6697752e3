//! # Peer Events
//!
//! Event types published by the peer dispatcher and the election protocol.

use serde::{Deserialize, Serialize};
use shared_types::{GatewayAddress, MessageKind, PeerId, SignedArtifact};

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PeerEvent {
    // =========================================================================
    // CONSENSUS FORWARDING
    // =========================================================================
    /// Opaque consensus payload received from a peer.
    ConsensusMessage {
        from: PeerId,
        data: Vec<u8>,
    },

    // =========================================================================
    // TSS CEREMONY TRAFFIC
    // =========================================================================
    /// Round message for a running TSS ceremony (`TSS_TASK`, `FETCH_TSS_NODES`).
    TssMessage {
        from: PeerId,
        kind: MessageKind,
        data: Vec<u8>,
    },

    /// Culprit report produced by a remote ceremony.
    TssCulprits {
        from: PeerId,
        data: Vec<u8>,
    },

    /// Aggregate TSS signature broadcast by a participant.
    TssSignResult {
        from: PeerId,
        artifact: SignedArtifact,
    },

    // =========================================================================
    // GATEWAY MASTER ELECTION
    // =========================================================================
    /// A master check for a gateway address finished.
    MasterResolved {
        address: GatewayAddress,
        master: PeerId,
        /// True when the local node claimed the master itself.
        self_elected: bool,
    },
}

impl PeerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ConsensusMessage { .. } => EventTopic::Consensus,
            Self::TssMessage { .. } => EventTopic::Tss,
            Self::TssCulprits { .. } => EventTopic::TssCulprits,
            Self::TssSignResult { .. } => EventTopic::TssSignResult,
            Self::MasterResolved { .. } => EventTopic::Election,
        }
    }

    /// Remote peer the event originated from, `None` for local events.
    #[must_use]
    pub fn source_peer(&self) -> Option<&PeerId> {
        match self {
            Self::ConsensusMessage { from, .. }
            | Self::TssMessage { from, .. }
            | Self::TssCulprits { from, .. }
            | Self::TssSignResult { from, .. } => Some(from),
            Self::MasterResolved { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Consensus,
    Tss,
    TssCulprits,
    TssSignResult,
    Election,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source peers to include. Empty means all sources, including local events.
    pub source_peers: Vec<PeerId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_peers: Vec::new(),
        }
    }

    /// Create a filter for events from specific peers.
    #[must_use]
    pub fn from_peers(peers: Vec<PeerId>) -> Self {
        Self {
            topics: Vec::new(),
            source_peers: peers,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &PeerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_peers.is_empty()
            || event
                .source_peer()
                .is_some_and(|peer| self.source_peers.contains(peer));

        topic_match && source_match
    }
}
