//! # Signature Coordination
//!
//! Multisig endorsements come back point-to-point; TSS results are
//! broadcast and surface on every other node's event bus.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        assert_no_kind, next_of_kind, plain_node, tss_node, Notice, ScriptedTss, TRANSFER_ID,
    };
    use node_runtime::adapters::{verify_endorsement, LoopbackHub};
    use peer_manager::domain::ibtp_digest;
    use peer_manager::{Ledger, NodeIdentity};
    use shared_bus::{EventFilter, EventTopic, PeerEvent};
    use shared_types::{
        Envelope, IbtpDirection, MessageKind, SignExtra, SignRequest, SignRequestKind,
        SignedArtifact, NOT_PARTIES_ACK_PAYLOAD,
    };
    use std::time::Duration;
    use tokio::time::timeout;

    fn parties(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn tss_request(kind: SignRequestKind, participants: &[&str]) -> SignRequest {
        SignRequest {
            kind,
            content: TRANSFER_ID.to_string(),
            extra: SignExtra {
                participants: parties(participants),
                artifact_tag: "round-1".to_string(),
                non_participants: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_multisig_endorsement_verifies() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let _c = plain_node(&hub, "c");
        let mut tap = hub.tap();

        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::new(MessageKind::FetchIbtpResponseSign, TRANSFER_ID.as_bytes().to_vec()),
        )
        .unwrap();

        let reply = next_of_kind(&mut tap, MessageKind::FetchIbtpSignAck).await;
        assert_eq!(&reply.to, a.peer_id());
        let artifact: SignedArtifact = reply.envelope.body().unwrap();
        assert_eq!(artifact.signer_address, b.identity().address());
        assert!(artifact.culprits.is_empty());

        let record = b
            .ledger()
            .get_ibtp(TRANSFER_ID, IbtpDirection::Response)
            .await
            .unwrap();
        assert!(verify_endorsement(
            &b.identity().verifying_key(),
            &ibtp_digest(&record),
            &artifact.signature
        ));

        // Point-to-point: nobody else gets a copy.
        assert_no_kind(&mut tap, MessageKind::FetchIbtpSignAck).await;
    }

    #[tokio::test]
    async fn test_block_signature_fetch() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::new(MessageKind::FetchBlockSign, b"2".to_vec()),
        )
        .unwrap();

        let artifact: SignedArtifact = next_of_kind(&mut tap, MessageKind::FetchBlockSignAck)
            .await
            .envelope
            .body()
            .unwrap();
        let block = b.ledger().get_block(2, false).await.unwrap();
        assert_eq!(artifact.signature, block.header.block_hash.to_vec());
        assert_eq!(artifact.signer_address, b.identity().address());
    }

    #[tokio::test]
    async fn test_tss_result_broadcast_to_peers() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let signer = ScriptedTss::with_culprits(&["p3"]);
        let b = tss_node(&hub, "b", signer.clone());
        let c = plain_node(&hub, "c");
        let mut a_events = a.subscribe(EventFilter::topics(vec![EventTopic::TssSignResult]));
        let mut c_events = c.subscribe(EventFilter::topics(vec![EventTopic::TssSignResult]));

        let request = tss_request(SignRequestKind::IbtpRequest, &["p1", "p2", "p3"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::FetchIbtpRequestTssSign, &request).unwrap(),
        )
        .unwrap();

        for events in [&mut a_events, &mut c_events] {
            let event = timeout(Duration::from_secs(1), events.recv())
                .await
                .expect("timeout waiting for TSS result")
                .expect("bus closed");
            match event {
                PeerEvent::TssSignResult { from, artifact } => {
                    assert_eq!(&from, b.peer_id());
                    assert_eq!(artifact.signer_address, b.identity().address());
                    assert_eq!(artifact.culprits, parties(&["p3"]));
                }
                other => panic!("expected TssSignResult, got {other:?}"),
            }
        }

        assert_eq!(signer.sign_calls(), vec![parties(&["p1", "p2", "p3"])]);
        assert_eq!(b.service().open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_non_participants_left_out_of_ceremony() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let signer = ScriptedTss::new();
        let b = tss_node(&hub, "b", signer.clone());
        let mut tap = hub.tap();

        let mut notice = tss_request(SignRequestKind::IbtpRequest, &["p1", "p2", "p3"]);
        notice.extra.non_participants = parties(&["p3"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::TssKeysignNotParties, &notice).unwrap(),
        )
        .unwrap();

        let ack = next_of_kind(&mut tap, MessageKind::TssKeysignNotPartiesAck).await;
        assert_eq!(&ack.to, a.peer_id());
        assert_eq!(ack.envelope.payload, NOT_PARTIES_ACK_PAYLOAD);
        assert_eq!(
            signer.notices(),
            vec![Notice {
                tag: "round-1".to_string(),
                participants: parties(&["p1", "p2", "p3"]),
                non_participants: parties(&["p3"]),
            }]
        );
        assert_eq!(b.service().open_sessions(), 1);

        let request = tss_request(SignRequestKind::IbtpRequest, &["p1", "p2", "p3"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::FetchIbtpRequestTssSign, &request).unwrap(),
        )
        .unwrap();

        next_of_kind(&mut tap, MessageKind::FetchIbtpTssSignAck).await;
        assert_eq!(signer.sign_calls(), vec![parties(&["p1", "p2"])]);
        assert_eq!(b.service().open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_exclusions_scoped_to_direction() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let signer = ScriptedTss::new();
        let b = tss_node(&hub, "b", signer.clone());
        let mut tap = hub.tap();

        let mut notice = tss_request(SignRequestKind::IbtpRequest, &["p1", "p2", "p3"]);
        notice.extra.non_participants = parties(&["p2"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::TssKeysignNotParties, &notice).unwrap(),
        )
        .unwrap();
        next_of_kind(&mut tap, MessageKind::TssKeysignNotPartiesAck).await;

        let request = tss_request(SignRequestKind::IbtpResponse, &["p1", "p2", "p3"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::FetchIbtpResponseTssSign, &request).unwrap(),
        )
        .unwrap();
        next_of_kind(&mut tap, MessageKind::FetchIbtpTssSignAck).await;

        assert_eq!(signer.sign_calls(), vec![parties(&["p1", "p2", "p3"])]);
        assert_eq!(b.service().open_sessions(), 1);
    }

    #[tokio::test]
    async fn test_tss_request_without_key_is_dropped() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        let request = tss_request(SignRequestKind::IbtpRequest, &["p1", "p2"]);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::FetchIbtpRequestTssSign, &request).unwrap(),
        )
        .unwrap();

        assert_no_kind(&mut tap, MessageKind::FetchIbtpTssSignAck).await;
    }
}
