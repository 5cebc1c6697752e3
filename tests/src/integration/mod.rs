//! Cross-node protocol flows.

mod block_sync;
mod election;
mod signing;
