//! # Node Configuration
//!
//! Loaded from an optional TOML file, then overridden from `RELAY_*`
//! environment variables, then validated.
//!
//! ```toml
//! [peer]
//! tss_enabled = true
//! master_check_timeout_ms = 3000
//!
//! [identity]
//! peer_id = "node-1"
//! signing_seed = "<64 hex chars>"
//! agency_cert = "certs/agency.cert"
//! node_cert = "certs/node.cert"
//!
//! [telemetry]
//! log_level = "debug"
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `RELAY_PEER_ID` | `identity.peer_id` |
//! | `RELAY_SIGNING_SEED` | `identity.signing_seed` |
//! | `RELAY_TSS_ENABLED` | `peer.tss_enabled` |
//! | `RELAY_MAX_IN_FLIGHT` | `peer.max_in_flight` |
//! | `RELAY_MASTER_CHECK_TIMEOUT_MS` | `peer.master_check_timeout_ms` |
//!
//! Telemetry variables are documented in `node-telemetry`.

use node_telemetry::TelemetryConfig;
use peer_manager::PeerManagerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Peer manager tuning.
    pub peer: PeerManagerConfig,
    /// Node identity and credentials.
    pub identity: IdentityConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Node identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Transport peer id of this node.
    pub peer_id: String,
    /// Hex-encoded 32-byte ed25519 seed. MUST be set.
    pub signing_seed: String,
    /// Agency certificate file, served verbatim.
    pub agency_cert: Option<PathBuf>,
    /// Node certificate file, served verbatim.
    pub node_cert: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            peer_id: "node-1".to_string(),
            signing_seed: String::new(),
            agency_cert: None,
            node_cert: None,
        }
    }
}

impl IdentityConfig {
    /// Decoded signing seed.
    pub fn seed(&self) -> Result<[u8; 32], ConfigError> {
        let bytes = hex::decode(self.signing_seed.trim_start_matches("0x"))
            .map_err(|e| ConfigError::InvalidSeed(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ConfigError::InvalidSeed(format!("expected 32 bytes, got {}", b.len())))?;
        if seed == [0u8; 32] {
            return Err(ConfigError::InvalidSeed("seed is all zeroes".to_string()));
        }
        Ok(seed)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid signing seed: {0}. Set RELAY_SIGNING_SEED to 64 hex characters")]
    InvalidSeed(String),

    #[error("identity.peer_id must not be empty")]
    MissingPeerId,

    #[error("peer.{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

impl NodeConfig {
    /// Load, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `RELAY_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let mut config = self.apply_overrides(|key| std::env::var(key).ok());
        config.telemetry = config.telemetry.with_env_overrides();
        config
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored with a
    /// warning.
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(peer_id) = lookup("RELAY_PEER_ID") {
            self.identity.peer_id = peer_id;
        }
        if let Some(seed) = lookup("RELAY_SIGNING_SEED") {
            self.identity.signing_seed = seed;
        }
        if let Some(value) = lookup("RELAY_TSS_ENABLED") {
            self.peer.tss_enabled = value.eq_ignore_ascii_case("true") || value == "1";
        }
        if let Some(value) = lookup("RELAY_MAX_IN_FLIGHT") {
            match value.parse() {
                Ok(limit) => self.peer.max_in_flight = limit,
                Err(_) => warn!(value = %value, "Ignoring invalid RELAY_MAX_IN_FLIGHT"),
            }
        }
        if let Some(value) = lookup("RELAY_MASTER_CHECK_TIMEOUT_MS") {
            match value.parse() {
                Ok(timeout) => self.peer.master_check_timeout_ms = timeout,
                Err(_) => warn!(value = %value, "Ignoring invalid RELAY_MASTER_CHECK_TIMEOUT_MS"),
            }
        }
        self
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.peer_id.trim().is_empty() {
            return Err(ConfigError::MissingPeerId);
        }
        self.identity.seed()?;
        if self.peer.max_in_flight == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_in_flight",
            });
        }
        if self.peer.master_check_timeout_ms == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "master_check_timeout_ms",
            });
        }
        if self.peer.session_ttl_secs == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "session_ttl_secs",
            });
        }
        Ok(())
    }
}
