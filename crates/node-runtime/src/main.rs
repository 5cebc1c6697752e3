//! # Relay Node
//!
//! Development entry point: one relay node on an in-process loopback hub,
//! serving a generated chain.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`RELAY_CONFIG` or the first argument, then `RELAY_*` overrides)
//! 2. Initialize logging and metrics
//! 3. Build the node and attach it to the hub
//! 4. Run until Ctrl+C, then detach

use anyhow::{Context, Result};
use node_runtime::adapters::{LoopbackHub, MemoryLedger};
use node_runtime::{NodeConfig, RelayNode};
use peer_manager::NodeIdentity;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Blocks in the generated development chain.
const DEV_CHAIN_LENGTH: u64 = 16;

fn config_path() -> Option<PathBuf> {
    std::env::var_os("RELAY_CONFIG")
        .map(PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(PathBuf::from))
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = NodeConfig::load(path.as_deref()).context("Failed to load configuration")?;

    let _telemetry = node_telemetry::init_telemetry(&config.telemetry)?;
    if let Some(path) = &path {
        info!(path = %path.display(), "Configuration loaded");
    }

    let hub = LoopbackHub::new();
    let node = RelayNode::from_config(&hub, &config, MemoryLedger::with_chain(DEV_CHAIN_LENGTH))
        .context("Failed to build relay node")?;

    info!(
        peer = %node.peer_id(),
        address = %node.identity().address(),
        tss_enabled = config.peer.tss_enabled,
        max_in_flight = config.peer.max_in_flight,
        height = ?node.ledger().height(),
        "Relay node running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;

    info!("Initiating shutdown...");
    match node_telemetry::encode_metrics() {
        Ok(metrics) => debug!(%metrics, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
    node.shutdown();
    info!("Shutdown complete");

    Ok(())
}
