use bytes::BytesMut;
use packlink_frame::{LinkConfig, Packet, FRAME_OVERHEAD, MAX_ENCODED_LEN};
use packlink_transport::ByteTransport;

use crate::context::LinkContext;
use crate::error::Result;
use crate::outcome::{ReceiveOutcome, SendOutcome};
use crate::stats::LinkStats;
use crate::{receiver, sender};

/// One end of the link that both sends and receives.
///
/// The exchange is half-duplex: a node either transmits a packet and waits
/// for its acknowledgement, or waits for a frame and acknowledges it, never
/// both at once. A router typically alternates `send_packet` and
/// `receive_packet` on the same node.
pub struct Node<T> {
    link: T,
    config: LinkConfig,
    stats: LinkStats,
    frame: BytesMut,
}

impl<T: ByteTransport> Node<T> {
    pub fn new(link: T) -> Self {
        Self::with_config(link, LinkConfig::default())
    }

    pub fn with_config(link: T, config: LinkConfig) -> Self {
        Self {
            link,
            config,
            stats: LinkStats::default(),
            frame: BytesMut::with_capacity(FRAME_OVERHEAD + MAX_ENCODED_LEN),
        }
    }

    /// See [`crate::Sender::send_packet`].
    pub fn send_packet<C: LinkContext + ?Sized>(
        &mut self,
        ctx: &C,
        packet: Packet,
    ) -> Result<SendOutcome> {
        sender::send_packet(
            &mut self.link,
            &self.config,
            &mut self.stats,
            &mut self.frame,
            ctx,
            packet,
        )
    }

    /// See [`crate::Sender::send_single_byte`].
    pub fn send_single_byte<C: LinkContext + ?Sized>(
        &mut self,
        ctx: &C,
        packet_type: u8,
        value: u8,
    ) -> Result<SendOutcome> {
        self.send_packet(ctx, Packet::single_byte(packet_type, value))
    }

    /// See [`crate::Receiver::receive_packet`].
    pub fn receive_packet<C: LinkContext + ?Sized>(&mut self, ctx: &C) -> Result<ReceiveOutcome> {
        receiver::receive_packet(&mut self.link, &self.config, &mut self.stats, ctx)
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &T {
        &self.link
    }

    pub fn into_inner(self) -> T {
        self.link
    }
}
