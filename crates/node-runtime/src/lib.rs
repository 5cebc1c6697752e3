//! # Node Runtime Library
//!
//! Configuration loading, development adapters and node assembly for the
//! `relay-node` binary. Exposed as a library for the multi-node tests.

#![allow(clippy::module_name_repetitions)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod node;

pub use config::{ConfigError, IdentityConfig, NodeConfig};
pub use node::{RelayNode, RelayService};
