//! Peer manager configuration.

use serde::Deserialize;
use std::time::Duration;

/// Peer manager configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerManagerConfig {
    /// Threshold-signature mode. Gates the transport public key fetch.
    pub tss_enabled: bool,
    /// Maximum handlers executing at once. Further frames wait for a slot
    /// inside their own task, never on the receive path.
    pub max_in_flight: usize,
    /// Default deadline for a gateway master check in milliseconds.
    pub master_check_timeout_ms: u64,
    /// Idle lifetime of a TSS signing session in seconds.
    pub session_ttl_secs: u64,
}

impl Default for PeerManagerConfig {
    fn default() -> Self {
        Self {
            tss_enabled: false,
            max_in_flight: 256,
            master_check_timeout_ms: 2_000,
            session_ttl_secs: 300,
        }
    }
}

impl PeerManagerConfig {
    /// Configuration for tests: TSS on, short deadlines.
    pub fn for_testing() -> Self {
        Self {
            tss_enabled: true,
            max_in_flight: 16,
            master_check_timeout_ms: 200,
            session_ttl_secs: 60,
        }
    }

    #[must_use]
    pub fn master_check_timeout(&self) -> Duration {
        Duration::from_millis(self.master_check_timeout_ms)
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
