//! Signature coordination and forwarding.
//!
//! Multisig endorsements go back point-to-point on the request stream. TSS
//! results are broadcast to the whole peer set, since every participant of
//! the ceremony needs the aggregate.

use shared_bus::PeerEvent;
use shared_types::{
    parse_height, Envelope, IbtpDirection, IbtpRecord, InboundStream, MessageKind, SignRequest,
    SignedArtifact, NOT_PARTIES_ACK_PAYLOAD,
};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::PeerMessagingService;
use crate::domain::{ibtp_digest, SessionKey};
use crate::error::PeerResult;
use crate::ports::outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSigner};

fn direction_of(kind: MessageKind) -> IbtpDirection {
    match kind {
        MessageKind::FetchIbtpResponseSign | MessageKind::FetchIbtpResponseTssSign => {
            IbtpDirection::Response
        }
        _ => IbtpDirection::Request,
    }
}

impl<N, L, T, I> PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork + 'static,
    L: Ledger + 'static,
    T: ThresholdSigner + 'static,
    I: NodeIdentity + 'static,
{
    pub(super) async fn handle_fetch_block_sign(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let height = parse_height(&envelope.payload)?;
        let signature = self.ledger.get_block_signature(height).await?;

        let artifact = SignedArtifact::plain(self.identity.address(), signature);
        let reply = Envelope::with_body(MessageKind::FetchBlockSignAck, &artifact)?;
        self.network.send_on_stream(stream, reply).await
    }

    /// Multisig endorsement of one IBTP leg with the node's own key.
    pub(super) async fn handle_fetch_ibtp_sign(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let id = envelope.payload_str()?;
        let direction = direction_of(envelope.kind);
        let record = self.ledger.get_ibtp(id, direction).await?;

        let signature = self.identity.sign(&ibtp_digest(&record))?;

        let artifact = SignedArtifact::plain(self.identity.address(), signature);
        let reply = Envelope::with_body(MessageKind::FetchIbtpSignAck, &artifact)?;
        self.network.send_on_stream(stream, reply).await
    }

    /// Run a TSS ceremony over one IBTP leg and broadcast the aggregate.
    ///
    /// Parties excluded from the session by earlier non-participation
    /// notices are left out of the ceremony.
    pub(super) async fn handle_fetch_ibtp_tss_sign(&self, envelope: &Envelope) -> PeerResult<()> {
        let request = SignRequest::decode(&envelope.payload)?;
        let direction = direction_of(envelope.kind);
        let record = self.ledger.get_ibtp(&request.content, direction).await?;
        let digest = ibtp_digest(&record);

        let key = SessionKey::new(&request.content, direction, &request.extra.artifact_tag);
        let participants = {
            let mut sessions = self.sessions.lock();
            let expired = sessions.prune(Instant::now());
            if expired > 0 {
                debug!(expired, "Pruned idle TSS sessions");
            }
            sessions.active_participants(&key, &request.extra.participants)
        };

        let signed = self
            .signer
            .sign_threshold(digest, &key.tag, &participants)
            .await?;
        self.sessions.lock().close(&key);

        let artifact = SignedArtifact {
            signer_address: self.identity.address(),
            signature: signed.signature,
            culprits: signed.culprits,
        };

        if artifact.culprits.is_empty() {
            info!(ibtp = %record.id, %direction, "TSS signature produced");
        } else {
            warn!(
                ibtp = %record.id,
                %direction,
                culprits = ?artifact.culprits,
                "TSS signature produced with culprits"
            );
        }

        let result = Envelope::with_body(MessageKind::FetchIbtpTssSignAck, &artifact)?;
        self.network.broadcast(result).await
    }

    /// Pass a non-participation notice to the capability, then record the
    /// exclusions for the session and acknowledge.
    ///
    /// A notice the capability rejects leaves the session untouched.
    pub(super) async fn handle_not_parties(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let request = SignRequest::decode(&envelope.payload)?;
        let direction = request.kind.direction();
        let record: IbtpRecord = self.ledger.get_ibtp(&request.content, direction).await?;

        let key = SessionKey::new(&request.content, direction, &request.extra.artifact_tag);
        self.signer
            .notify_non_participants(
                ibtp_digest(&record),
                &key.tag,
                &request.extra.participants,
                &request.extra.non_participants,
            )
            .await?;
        self.sessions
            .lock()
            .record_exclusions(&key, &request.extra.non_participants, Instant::now());

        let ack = Envelope::new(MessageKind::TssKeysignNotPartiesAck, NOT_PARTIES_ACK_PAYLOAD);
        self.network.send_on_stream(stream, ack).await
    }

    /// Publish payloads owned by other subsystems on the event bus.
    pub(super) async fn forward(&self, stream: &InboundStream, envelope: Envelope) -> PeerResult<()> {
        let kind = envelope.kind;
        let from = self.network.remote_peer_id(stream);
        let event = match kind {
            MessageKind::Consensus => PeerEvent::ConsensusMessage {
                from,
                data: envelope.payload,
            },
            MessageKind::TssCulprits => PeerEvent::TssCulprits {
                from,
                data: envelope.payload,
            },
            MessageKind::FetchIbtpTssSignAck => PeerEvent::TssSignResult {
                from,
                artifact: envelope.body()?,
            },
            _ => PeerEvent::TssMessage {
                from,
                kind,
                data: envelope.payload,
            },
        };

        let receivers = self.bus.publish(event).await;
        if receivers == 0 {
            debug!(kind = %kind, "Forwarded message had no subscribers");
        }
        Ok(())
    }
}
