//! # Block Sync and Credential Exchange
//!
//! One node queries another over the hub and inspects the reply frames.

#[cfg(test)]
mod tests {
    use crate::fixtures::{assert_no_kind, next_of_kind, plain_node, tss_node, ScriptedTss, CHAIN_LENGTH};
    use node_runtime::adapters::LoopbackHub;
    use peer_manager::NodeIdentity;
    use shared_types::{
        Block, BlockHeadersResponse, BlockRangeRequest, BlocksResponse, CertsMessage, Envelope,
        MessageKind, PeerId, TssInfo, TssPublicKey,
    };

    #[tokio::test]
    async fn test_get_block_returns_full_block() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        hub.deliver(a.peer_id(), b.peer_id(), Envelope::new(MessageKind::GetBlock, b"3".to_vec()))
            .unwrap();

        let reply = next_of_kind(&mut tap, MessageKind::GetBlockAck).await;
        assert_eq!(&reply.to, a.peer_id());
        let block: Block = reply.envelope.body().unwrap();
        assert_eq!(block.number(), 3);
        assert!(!block.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_range_queries_are_ascending() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        let range = BlockRangeRequest::new(2, 5);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::GetBlockHeaders, &range).unwrap(),
        )
        .unwrap();
        let headers: BlockHeadersResponse = next_of_kind(&mut tap, MessageKind::GetBlockHeadersAck)
            .await
            .envelope
            .body()
            .unwrap();
        let numbers: Vec<u64> = headers.headers.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![2, 3, 4, 5]);

        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::GetBlocks, &range).unwrap(),
        )
        .unwrap();
        let blocks: BlocksResponse = next_of_kind(&mut tap, MessageKind::GetBlocksAck)
            .await
            .envelope
            .body()
            .unwrap();
        assert_eq!(blocks.blocks.len(), 4);
        for pair in blocks.blocks.windows(2) {
            assert_eq!(pair[1].header.parent_hash, pair[0].header.block_hash);
        }
    }

    #[tokio::test]
    async fn test_range_past_tip_gets_no_reply() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        let range = BlockRangeRequest::new(CHAIN_LENGTH - 1, CHAIN_LENGTH + 2);
        hub.deliver(
            a.peer_id(),
            b.peer_id(),
            Envelope::with_body(MessageKind::GetBlocks, &range).unwrap(),
        )
        .unwrap();

        assert_no_kind(&mut tap, MessageKind::GetBlocksAck).await;
    }

    #[tokio::test]
    async fn test_certificates_exchanged() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        hub.deliver(b.peer_id(), a.peer_id(), Envelope::new(MessageKind::FetchCert, Vec::new()))
            .unwrap();

        let reply = next_of_kind(&mut tap, MessageKind::FetchCertAck).await;
        assert_eq!(&reply.from, a.peer_id());
        let certs: CertsMessage = reply.envelope.body().unwrap();
        assert_eq!(certs.agency_cert, a.identity().agency_cert());
        assert_eq!(certs.node_cert, b"a-node-cert");
    }

    #[tokio::test]
    async fn test_tss_key_material_from_tss_node() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = tss_node(&hub, "b", ScriptedTss::new());
        let mut tap = hub.tap();

        hub.deliver(a.peer_id(), b.peer_id(), Envelope::new(MessageKind::FetchP2pPubkey, Vec::new()))
            .unwrap();
        let key = next_of_kind(&mut tap, MessageKind::FetchP2pPubkeyAck).await;
        assert_eq!(key.envelope.payload, b.identity().transport_public_key().unwrap());

        hub.deliver(a.peer_id(), b.peer_id(), Envelope::new(MessageKind::FetchTssPubkey, Vec::new()))
            .unwrap();
        let tss_key: TssPublicKey = next_of_kind(&mut tap, MessageKind::FetchTssPubkeyAck)
            .await
            .envelope
            .body()
            .unwrap();
        assert_eq!(tss_key.address, "0xtss");

        hub.deliver(a.peer_id(), b.peer_id(), Envelope::new(MessageKind::FetchTssInfo, Vec::new()))
            .unwrap();
        let info: TssInfo = next_of_kind(&mut tap, MessageKind::FetchTssInfoAck)
            .await
            .envelope
            .body()
            .unwrap();
        assert_eq!(info.threshold, 2);
        assert_eq!(info.participants.len(), 3);
    }

    #[tokio::test]
    async fn test_node_without_tss_key_stays_silent() {
        let hub = LoopbackHub::new();
        let a = plain_node(&hub, "a");
        let b = plain_node(&hub, "b");
        let mut tap = hub.tap();

        hub.deliver(a.peer_id(), b.peer_id(), Envelope::new(MessageKind::FetchTssPubkey, Vec::new()))
            .unwrap();
        assert_no_kind(&mut tap, MessageKind::FetchTssPubkeyAck).await;

        hub.deliver(
            &PeerId::new("a"),
            b.peer_id(),
            Envelope::new(MessageKind::FetchTssInfo, Vec::new()),
        )
        .unwrap();
        assert_no_kind(&mut tap, MessageKind::FetchTssInfoAck).await;
    }
}
