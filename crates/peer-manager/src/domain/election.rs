//! # Gateway Master Election
//!
//! Several gateway processes may represent the same external identity (a
//! gateway address). Each node keeps a [`GatewayDirectory`] of the gateway
//! instances connected to it and which of them, if any, is master.
//!
//! A master learned from another node's ack is kept apart from local
//! instances. It shows up in [`ElectionState`] but is never reported back to
//! querying nodes, so a gateway that leaves the node hosting it cannot be
//! kept alive by copies held elsewhere.
//!
//! ## State Machine (per address, per node)
//!
//! ```text
//!             check_master
//!   Unknown ───────────────→ Pending ──deadline──→ HasMaster(peer)
//!      │                        ↑
//!      │ register_gateway       │ check_master
//!      ↓                        │
//!   NoMaster ───────────────────┘
//!      ↑
//!      └── remove_gateway(master) / stale master cleared
//! ```
//!
//! ## Resolution Policy
//!
//! The initiator collects every `HAS_MASTER` ack until its deadline and then
//! resolves all of them at once:
//!
//! 1. Claims from responders that were *not* themselves running a check for
//!    the address are established masters. The lowest named peer wins.
//! 2. Otherwise the remaining claims come from competing initiators. The
//!    lowest peer among them and the local candidate wins. No claims at all
//!    means the local candidate is elected.
//!
//! The outcome depends only on the set of claims, never on arrival order, so
//! two competing initiators that see each other's claims agree on the winner.

use shared_types::{GatewayAddress, PeerId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Locally observed election state of one gateway address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionState {
    /// No local record.
    Unknown,
    /// A master check is awaiting acks.
    Pending,
    /// The named gateway peer is believed to be master.
    HasMaster(PeerId),
    /// Address known, no current master.
    NoMaster,
}

/// Directory entry for one gateway address.
///
/// Invariant: `master`, when set, is a member of `known_peers`. At most one
/// of `master` and `adopted` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayEntry {
    /// Instances connected to this node.
    pub known_peers: BTreeSet<PeerId>,
    /// Local instance elected master.
    pub master: Option<PeerId>,
    /// Master hosted by another node, taken from the last check.
    pub adopted: Option<PeerId>,
}

/// Gateway address → known peers and master.
#[derive(Debug, Default)]
pub struct GatewayDirectory {
    entries: HashMap<GatewayAddress, GatewayEntry>,
}

impl GatewayDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `peer` as a known instance of `address`.
    ///
    /// Returns `true` if the peer was not known before.
    pub fn register(&mut self, address: &str, peer: PeerId) -> bool {
        self.entries
            .entry(address.to_string())
            .or_default()
            .known_peers
            .insert(peer)
    }

    /// Forget `peer` for `address`.
    ///
    /// Clears the master if `peer` held it and drops the entry once no peers
    /// remain. Returns `true` if the peer was known.
    pub fn remove(&mut self, address: &str, peer: &PeerId) -> bool {
        let Some(entry) = self.entries.get_mut(address) else {
            return false;
        };

        let removed = entry.known_peers.remove(peer);
        if entry.master.as_ref() == Some(peer) {
            entry.master = None;
        }
        if entry.known_peers.is_empty() {
            self.entries.remove(address);
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    #[must_use]
    pub fn entry(&self, address: &str) -> Option<&GatewayEntry> {
        self.entries.get(address)
    }

    /// Master on file for `address`, if it is still a known peer.
    ///
    /// A master that is no longer a known peer is stale and gets cleared.
    pub fn live_master(&mut self, address: &str) -> Option<PeerId> {
        let entry = self.entries.get_mut(address)?;
        match &entry.master {
            Some(master) if entry.known_peers.contains(master) => Some(master.clone()),
            Some(_) => {
                entry.master = None;
                None
            }
            None => None,
        }
    }

    /// Clear the master flag for `address`, keeping its known peers.
    pub fn clear_master(&mut self, address: &str) {
        if let Some(entry) = self.entries.get_mut(address) {
            entry.master = None;
        }
    }

    /// Record the winner of a check for `address`.
    ///
    /// A winner among the local instances becomes the master; any other
    /// winner is only adopted. Nothing is recorded once every local instance
    /// of the address has been removed.
    pub fn record_outcome(&mut self, address: &str, winner: PeerId) {
        let Some(entry) = self.entries.get_mut(address) else {
            return;
        };
        if entry.known_peers.contains(&winner) {
            entry.master = Some(winner);
            entry.adopted = None;
        } else {
            entry.master = None;
            entry.adopted = Some(winner);
        }
    }

    /// State of `address`, ignoring any in-flight check.
    #[must_use]
    pub fn state(&self, address: &str) -> ElectionState {
        match self.entries.get(address) {
            None => ElectionState::Unknown,
            Some(entry) => match entry.master.as_ref().or(entry.adopted.as_ref()) {
                Some(master) => ElectionState::HasMaster(master.clone()),
                None => ElectionState::NoMaster,
            },
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A `HAS_MASTER` ack received during a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterClaim {
    /// Node that sent the ack.
    pub responder: PeerId,
    /// Gateway peer the responder names as master.
    pub master: PeerId,
}

/// Result of a finished master check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionOutcome {
    pub master: PeerId,
    /// True when the local candidate won.
    pub self_elected: bool,
}

/// Resolve a master check from every claim collected before the deadline.
///
/// `competitors` are the nodes whose own check for the same address arrived
/// while ours was pending.
#[must_use]
pub fn resolve_election(
    candidate: &PeerId,
    claims: &[MasterClaim],
    competitors: &HashSet<PeerId>,
) -> ElectionOutcome {
    let established = claims
        .iter()
        .filter(|claim| !competitors.contains(&claim.responder))
        .map(|claim| &claim.master)
        .min();

    if let Some(master) = established {
        return ElectionOutcome {
            master: master.clone(),
            self_elected: master == candidate,
        };
    }

    let winner = claims
        .iter()
        .map(|claim| &claim.master)
        .chain(std::iter::once(candidate))
        .min()
        .unwrap_or(candidate);

    ElectionOutcome {
        master: winner.clone(),
        self_elected: winner == candidate,
    }
}
