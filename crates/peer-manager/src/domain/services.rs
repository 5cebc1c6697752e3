//! Pure domain services.

use sha2::{Digest, Sha256};
use shared_types::{Hash, IbtpRecord};

/// Digest signed by multisig and TSS endorsements of an IBTP leg.
///
/// `SHA-256(id || direction_tag || content_hash)`, so the request and
/// response legs of one transfer never share a signature.
#[must_use]
pub fn ibtp_digest(record: &IbtpRecord) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(record.id.as_bytes());
    hasher.update([record.direction.tag()]);
    hasher.update(record.content_hash);
    hasher.finalize().into()
}
