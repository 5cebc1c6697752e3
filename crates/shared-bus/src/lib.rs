//! # Shared Bus - In-Process Event Bus
//!
//! Carries payloads the peer dispatcher does not answer itself into the
//! subsystems that own them: consensus messages, TSS round traffic, culprit
//! notices, TSS signature results and gateway election outcomes.
//!
//! | Topic | Published for |
//! |-------|---------------|
//! | `Consensus` | `CONSENSUS` frames |
//! | `Tss` | `TSS_TASK`, `FETCH_TSS_NODES` frames |
//! | `TssCulprits` | `TSS_CULPRITS` frames |
//! | `TssSignResult` | inbound `FETCH_IBTP_TSS_SIGN_ACK` broadcasts |
//! | `Election` | every finished local master check |
//!
//! Delivery is best effort: a slow subscriber that lags behind the channel
//! capacity loses the oldest events, and events no subscription accepts are
//! dropped at the publisher.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, PeerEvent};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
