//! Shared fixtures for multi-node tests.

use async_trait::async_trait;
use node_runtime::adapters::{Delivery, Ed25519Identity, LoopbackHub, MemoryLedger, UnavailableTss};
use node_runtime::RelayNode;
use parking_lot::Mutex;
use peer_manager::{PeerManagerConfig, PeerResult, ThresholdSignature, ThresholdSigner};
use rand::RngCore;
use shared_types::{Hash, MessageKind, PeerId, TssInfo, TssParticipant, TssPublicKey};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Transfer every fixture ledger holds both legs of.
pub const TRANSFER_ID: &str = "1356:chain-a:chain-b-1";

/// Blocks in every fixture ledger.
pub const CHAIN_LENGTH: u64 = 8;

fn ledger() -> MemoryLedger {
    let ledger = MemoryLedger::with_chain(CHAIN_LENGTH);
    ledger.insert_transfer(TRANSFER_ID, b"transfer payload");
    ledger
}

fn identity(name: &str) -> Ed25519Identity {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    Ed25519Identity::from_seed(
        seed,
        format!("{name}-agency-cert").into_bytes(),
        format!("{name}-node-cert").into_bytes(),
    )
}

/// Node without a TSS key.
pub fn plain_node(hub: &Arc<LoopbackHub>, name: &str) -> RelayNode<UnavailableTss> {
    RelayNode::spawn(
        hub,
        PeerId::new(name),
        PeerManagerConfig::for_testing(),
        identity(name),
        ledger(),
        UnavailableTss,
    )
}

/// Node holding a key share, signing through `signer`.
pub fn tss_node(hub: &Arc<LoopbackHub>, name: &str, signer: ScriptedTss) -> RelayNode<ScriptedTss> {
    RelayNode::spawn(
        hub,
        PeerId::new(name),
        PeerManagerConfig::for_testing(),
        identity(name),
        ledger(),
        signer,
    )
}

/// A non-participation notice seen by the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tag: String,
    pub participants: Vec<String>,
    pub non_participants: Vec<String>,
}

#[derive(Default)]
struct ScriptedState {
    sign_calls: Vec<Vec<String>>,
    notices: Vec<Notice>,
}

/// Threshold signer that answers immediately and records every call.
#[derive(Clone, Default)]
pub struct ScriptedTss {
    culprits: Vec<String>,
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedTss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `culprits` with every signature.
    pub fn with_culprits(culprits: &[&str]) -> Self {
        Self {
            culprits: culprits.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Participant lists passed to each ceremony, in call order.
    pub fn sign_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().sign_calls.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().notices.clone()
    }
}

#[async_trait]
impl ThresholdSigner for ScriptedTss {
    async fn public_key(&self) -> PeerResult<TssPublicKey> {
        Ok(TssPublicKey {
            address: "0xtss".to_string(),
            public_key: vec![0x02; 33],
        })
    }

    async fn participant_info(&self) -> PeerResult<TssInfo> {
        Ok(TssInfo {
            threshold: 2,
            participants: ["p1", "p2", "p3"]
                .iter()
                .map(|id| TssParticipant {
                    party_id: id.to_string(),
                    public_key: id.as_bytes().to_vec(),
                })
                .collect(),
        })
    }

    async fn sign_threshold(
        &self,
        digest: Hash,
        _tag: &str,
        participants: &[String],
    ) -> PeerResult<ThresholdSignature> {
        self.state.lock().sign_calls.push(participants.to_vec());
        Ok(ThresholdSignature {
            signature: digest.to_vec(),
            culprits: self.culprits.clone(),
        })
    }

    async fn notify_non_participants(
        &self,
        _digest: Hash,
        tag: &str,
        participants: &[String],
        non_participants: &[String],
    ) -> PeerResult<()> {
        self.state.lock().notices.push(Notice {
            tag: tag.to_string(),
            participants: participants.to_vec(),
            non_participants: non_participants.to_vec(),
        });
        Ok(())
    }
}

/// Next delivery of `kind` on the hub tap, skipping everything else.
pub async fn next_of_kind(tap: &mut UnboundedReceiver<Delivery>, kind: MessageKind) -> Delivery {
    timeout(Duration::from_secs(1), async {
        loop {
            match tap.recv().await {
                Some(delivery) if delivery.envelope.kind == kind => return delivery,
                Some(_) => continue,
                None => panic!("hub tap closed while waiting for {kind}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {kind} delivered"))
}

/// Assert that nothing of `kind` crosses the hub for a while.
pub async fn assert_no_kind(tap: &mut UnboundedReceiver<Delivery>, kind: MessageKind) {
    let result = timeout(Duration::from_millis(100), async {
        loop {
            match tap.recv().await {
                Some(delivery) if delivery.envelope.kind == kind => return delivery,
                Some(_) => continue,
                None => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(result.is_err(), "unexpected {kind} delivered");
}
