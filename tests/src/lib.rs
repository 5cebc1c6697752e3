//! # Relay Node Test Suite
//!
//! Multi-node tests: several relay nodes wired to one loopback hub,
//! exercising the peer protocols end to end.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Node builders, scripted TSS signer, tap helpers
//! └── integration/
//!     ├── block_sync.rs # Block, header and credential fetches
//!     ├── election.rs   # Gateway master election across nodes
//!     └── signing.rs    # Multisig, TSS and non-participation flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::election
//! ```

pub mod fixtures;
pub mod integration;
