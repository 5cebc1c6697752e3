//! Threshold signer for nodes without a TSS key.

use async_trait::async_trait;
use peer_manager::{PeerManagerError, PeerResult, ThresholdSignature, ThresholdSigner};
use shared_types::{Hash, TssInfo, TssPublicKey};

/// Signer that reports the capability as unavailable on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableTss;

fn unavailable<T>() -> PeerResult<T> {
    Err(PeerManagerError::CapabilityUnavailable(
        "no TSS key on this node".to_string(),
    ))
}

#[async_trait]
impl ThresholdSigner for UnavailableTss {
    async fn public_key(&self) -> PeerResult<TssPublicKey> {
        unavailable()
    }

    async fn participant_info(&self) -> PeerResult<TssInfo> {
        unavailable()
    }

    async fn sign_threshold(
        &self,
        _digest: Hash,
        _tag: &str,
        _participants: &[String],
    ) -> PeerResult<ThresholdSignature> {
        unavailable()
    }

    async fn notify_non_participants(
        &self,
        _digest: Hash,
        _tag: &str,
        _participants: &[String],
        _non_participants: &[String],
    ) -> PeerResult<()> {
        unavailable()
    }
}
