//! Domain layer for the peer control plane.
//!
//! Pure state and rules, no I/O:
//! - `election`: gateway directory and the master resolution policy
//! - `session`: TSS session exclusions
//! - `services`: artifact digests

pub mod election;
pub mod services;
pub mod session;

pub use election::{
    resolve_election, ElectionOutcome, ElectionState, GatewayDirectory, GatewayEntry, MasterClaim,
};
pub use services::ibtp_digest;
pub use session::{SessionKey, SessionRegistry};
