//! # In-Memory Ledger
//!
//! Serves blocks, finality signatures and IBTP legs from maps. Used by the
//! development binary and by the multi-node tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use peer_manager::{Ledger, PeerManagerError, PeerResult};
use sha2::{Digest, Sha256};
use shared_types::{Block, BlockHeader, Hash, IbtpDirection, IbtpRecord};
use std::collections::HashMap;

/// Ledger adapter backed by in-memory maps.
#[derive(Default)]
pub struct MemoryLedger {
    blocks: RwLock<HashMap<u64, Block>>,
    signatures: RwLock<HashMap<u64, Vec<u8>>>,
    ibtps: RwLock<HashMap<(String, IbtpDirection), IbtpRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger holding a linked chain of `length` blocks starting at genesis.
    ///
    /// Every block carries one transaction and a placeholder signature.
    pub fn with_chain(length: u64) -> Self {
        let ledger = Self::new();
        let mut parent_hash = [0u8; 32];
        for number in 0..length {
            let transactions = vec![format!("tx-{number}").into_bytes()];
            let tx_root = hash_parts(&transactions.iter().map(Vec::as_slice).collect::<Vec<_>>());
            let block_hash = hash_parts(&[&number.to_be_bytes()[..], &parent_hash[..], &tx_root[..]]);

            ledger.insert_block(Block {
                header: BlockHeader {
                    number,
                    block_hash,
                    parent_hash,
                    tx_root,
                    timestamp: 1_700_000_000 + number,
                },
                transactions,
            });
            ledger.insert_signature(number, block_hash.to_vec());
            parent_hash = block_hash;
        }
        ledger
    }

    pub fn insert_block(&self, block: Block) {
        self.blocks.write().insert(block.number(), block);
    }

    pub fn insert_signature(&self, height: u64, signature: Vec<u8>) {
        self.signatures.write().insert(height, signature);
    }

    pub fn insert_ibtp(&self, record: IbtpRecord) {
        self.ibtps
            .write()
            .insert((record.id.clone(), record.direction), record);
    }

    /// Store both legs of a transfer, hashing `content` for each.
    pub fn insert_transfer(&self, id: &str, content: &[u8]) {
        for direction in [IbtpDirection::Request, IbtpDirection::Response] {
            self.insert_ibtp(IbtpRecord {
                id: id.to_string(),
                direction,
                content_hash: hash_parts(&[content, &[direction.tag()][..]]),
            });
        }
    }

    pub fn height(&self) -> Option<u64> {
        self.blocks.read().keys().max().copied()
    }
}

fn hash_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_block(&self, height: u64, include_body: bool) -> PeerResult<Block> {
        let blocks = self.blocks.read();
        let block = blocks
            .get(&height)
            .ok_or(PeerManagerError::BlockNotFound { height })?;
        Ok(if include_body {
            block.clone()
        } else {
            block.without_body()
        })
    }

    async fn get_block_signature(&self, height: u64) -> PeerResult<Vec<u8>> {
        self.signatures
            .read()
            .get(&height)
            .cloned()
            .ok_or(PeerManagerError::SignatureNotFound { height })
    }

    async fn get_ibtp(&self, id: &str, direction: IbtpDirection) -> PeerResult<IbtpRecord> {
        self.ibtps
            .read()
            .get(&(id.to_string(), direction))
            .cloned()
            .ok_or_else(|| PeerManagerError::IbtpNotFound {
                id: id.to_string(),
                direction,
            })
    }
}
