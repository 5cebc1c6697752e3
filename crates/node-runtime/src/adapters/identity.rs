//! # Ed25519 Node Identity
//!
//! The node's own signing key and the certificates it serves. The address is
//! `0x` followed by the last 20 bytes of `SHA-256(public key)`, hex-encoded.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use peer_manager::{NodeIdentity, PeerManagerError, PeerResult};
use sha2::{Digest, Sha256};
use shared_types::Hash;
use std::path::Path;

use crate::config::{ConfigError, IdentityConfig};

/// Node identity backed by an ed25519 key.
pub struct Ed25519Identity {
    signing_key: SigningKey,
    address: String,
    agency_cert: Vec<u8>,
    node_cert: Vec<u8>,
}

impl Ed25519Identity {
    pub fn from_seed(seed: [u8; 32], agency_cert: Vec<u8>, node_cert: Vec<u8>) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let address = derive_address(&signing_key.verifying_key());
        Self {
            signing_key,
            address,
            agency_cert,
            node_cert,
        }
    }

    /// Build from configuration, reading the certificate files if set.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let agency_cert = read_cert(config.agency_cert.as_deref())?;
        let node_cert = read_cert(config.node_cert.as_deref())?;
        Ok(Self::from_seed(config.seed()?, agency_cert, node_cert))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

fn read_cert(path: Option<&Path>) -> Result<Vec<u8>, ConfigError> {
    match path {
        Some(path) => std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

fn derive_address(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Check a multisig endorsement produced by [`Ed25519Identity::sign`].
pub fn verify_endorsement(key: &VerifyingKey, digest: &Hash, signature: &[u8]) -> bool {
    Signature::from_slice(signature)
        .map(|signature| key.verify(digest, &signature).is_ok())
        .unwrap_or(false)
}

impl NodeIdentity for Ed25519Identity {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn agency_cert(&self) -> Vec<u8> {
        self.agency_cert.clone()
    }

    fn node_cert(&self) -> Vec<u8> {
        self.node_cert.clone()
    }

    fn transport_public_key(&self) -> PeerResult<Vec<u8>> {
        Ok(self.verifying_key().to_bytes().to_vec())
    }

    fn sign(&self, digest: &Hash) -> PeerResult<Vec<u8>> {
        let signature = self
            .signing_key
            .try_sign(digest)
            .map_err(|e| PeerManagerError::Crypto(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}
