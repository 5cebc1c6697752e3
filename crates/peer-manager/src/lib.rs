//! # Peer Manager
//!
//! The node's peer-to-peer control plane: decodes inbound frames, routes each
//! kind to its handler and answers, broadcasts or forwards the result.
//!
//! ## Architecture Role
//!
//! ```text
//! [Transport] ──frame──→ [Dispatcher] ──┬──→ Block Sync ───────────┐
//!                                       ├──→ Credential Exchange ──┤
//!                                       ├──→ Signature Coordination┼──→ [Transport]
//!                                       ├──→ Master Election ──────┘
//!                                       └──→ [Event Bus] (consensus, TSS rounds)
//! ```
//!
//! ## Failure Model
//!
//! Every failure is terminal for its own message only: it is logged and the
//! reply is withheld. Remote callers detect failure by timing out.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::PeerManagerConfig;
pub use domain::{ElectionOutcome, ElectionState, GatewayDirectory, SessionKey, SessionRegistry};
pub use error::{ErrorClass, PeerManagerError, PeerResult};
pub use ports::inbound::{FrameDispatcher, GatewayElectionApi};
pub use ports::outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSignature, ThresholdSigner};
pub use service::{handling_for, Handling, PeerMessagingService};
