//! # Adapter Implementations
//!
//! Development implementations of the peer manager's outbound ports.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `PeerNetwork` | [`LoopbackNetwork`] over a shared [`LoopbackHub`] |
//! | `Ledger` | [`MemoryLedger`] |
//! | `NodeIdentity` | [`Ed25519Identity`] |
//! | `ThresholdSigner` | [`UnavailableTss`] |

pub mod identity;
pub mod ledger;
pub mod loopback;
pub mod tss;

pub use identity::{verify_endorsement, Ed25519Identity};
pub use ledger::MemoryLedger;
pub use loopback::{Delivery, LoopbackHub, LoopbackNetwork};
pub use tss::UnavailableTss;
