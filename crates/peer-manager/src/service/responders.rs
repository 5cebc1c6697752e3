//! Block sync and credential exchange responders.
//!
//! All of these are read-only and answer on the stream the request came in
//! on. A lookup failure withholds the reply.

use shared_types::{
    parse_height, BlockHeadersResponse, BlockRangeRequest, BlocksResponse, CertsMessage, Envelope,
    InboundStream, MessageKind,
};
use tracing::debug;

use super::PeerMessagingService;
use crate::error::PeerResult;
use crate::ports::outbound::{Ledger, NodeIdentity, PeerNetwork, ThresholdSigner};

impl<N, L, T, I> PeerMessagingService<N, L, T, I>
where
    N: PeerNetwork + 'static,
    L: Ledger + 'static,
    T: ThresholdSigner + 'static,
    I: NodeIdentity + 'static,
{
    // =========================================================================
    // BLOCK SYNC
    // =========================================================================

    pub(super) async fn handle_get_block(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let height = parse_height(&envelope.payload)?;
        let block = self.ledger.get_block(height, true).await?;

        let reply = Envelope::with_body(MessageKind::GetBlockAck, &block)?;
        self.network.send_on_stream(stream, reply).await
    }

    /// Headers for `start..=end`, ascending. One missing height aborts the
    /// whole reply.
    pub(super) async fn handle_get_block_headers(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let request: BlockRangeRequest = envelope.body()?;

        let mut headers = Vec::new();
        for height in request.heights() {
            let block = self.ledger.get_block(height, false).await?;
            headers.push(block.header);
        }

        let reply = Envelope::with_body(
            MessageKind::GetBlockHeadersAck,
            &BlockHeadersResponse { headers },
        )?;
        self.network.send_on_stream(stream, reply).await
    }

    /// Full blocks for `start..=end`, ascending. One missing height aborts
    /// the whole reply.
    pub(super) async fn handle_get_blocks(
        &self,
        stream: &InboundStream,
        envelope: &Envelope,
    ) -> PeerResult<()> {
        let request: BlockRangeRequest = envelope.body()?;

        let mut blocks = Vec::new();
        for height in request.heights() {
            blocks.push(self.ledger.get_block(height, true).await?);
        }

        let reply = Envelope::with_body(MessageKind::GetBlocksAck, &BlocksResponse { blocks })?;
        self.network.send_on_stream(stream, reply).await
    }

    // =========================================================================
    // CREDENTIAL EXCHANGE
    // =========================================================================

    pub(super) async fn handle_fetch_cert(&self, stream: &InboundStream) -> PeerResult<()> {
        let certs = CertsMessage {
            agency_cert: self.identity.agency_cert(),
            node_cert: self.identity.node_cert(),
        };

        let reply = Envelope::with_body(MessageKind::FetchCertAck, &certs)?;
        self.network.send_on_stream(stream, reply).await
    }

    /// Only answered in TSS mode.
    pub(super) async fn handle_fetch_p2p_pubkey(&self, stream: &InboundStream) -> PeerResult<()> {
        if !self.config.tss_enabled {
            debug!(peer = %stream.remote_peer, "TSS disabled, not serving transport key");
            return Ok(());
        }

        let key = self.identity.transport_public_key()?;
        let reply = Envelope::new(MessageKind::FetchP2pPubkeyAck, key);
        self.network.send_on_stream(stream, reply).await
    }

    pub(super) async fn handle_fetch_tss_pubkey(&self, stream: &InboundStream) -> PeerResult<()> {
        let key = self.signer.public_key().await?;

        let reply = Envelope::with_body(MessageKind::FetchTssPubkeyAck, &key)?;
        self.network.send_on_stream(stream, reply).await
    }

    pub(super) async fn handle_fetch_tss_info(&self, stream: &InboundStream) -> PeerResult<()> {
        let info = self.signer.participant_info().await?;

        let reply = Envelope::with_body(MessageKind::FetchTssInfoAck, &info)?;
        self.network.send_on_stream(stream, reply).await
    }
}
