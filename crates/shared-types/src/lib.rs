//! # Shared Types Crate
//!
//! Wire-level types exchanged between relay nodes over the peer transport.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every message kind and payload shape lives here.
//! - **Opaque Envelope**: the `Envelope` carries a kind code and raw payload bytes;
//!   the payload is only interpreted by the handler registered for that kind.
//! - **Forward Compatibility**: kind codes this node does not know decode to
//!   `MessageKind::Unknown` instead of failing.

pub mod codec;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use codec::{decode, encode};
pub use entities::*;
pub use envelope::{Envelope, MessageKind};
pub use errors::*;
pub use ipc::*;
