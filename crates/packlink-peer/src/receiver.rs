use packlink_frame::{
    decode, Ack, Checksum, LinkConfig, Packet, CHECKSUMMED_LEN, MAX_ENCODED_LEN, PACKET_SIZE,
    SENTINEL,
};
use packlink_transport::ByteTransport;
use tracing::{debug, trace};

use crate::context::LinkContext;
use crate::error::Result;
use crate::outcome::ReceiveOutcome;
use crate::stats::LinkStats;

/// Consecutive sentinels that open a frame.
const SENTINEL_RUN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Counting consecutive sentinel bytes.
    SeekSentinel { run: u8 },
    ReadLength,
    ReadBody { len: usize, filled: usize },
}

impl State {
    /// A sentinel seen where a frame byte was expected opens a new sentinel run.
    const RESTART: State = State::SeekSentinel { run: 1 };
}

/// Receives packets from a byte transport.
pub struct Receiver<T> {
    link: T,
    config: LinkConfig,
    stats: LinkStats,
}

impl<T: ByteTransport> Receiver<T> {
    /// Create a receiver with the default link policy.
    pub fn new(link: T) -> Self {
        Self::with_config(link, LinkConfig::default())
    }

    pub fn with_config(link: T, config: LinkConfig) -> Self {
        Self {
            link,
            config,
            stats: LinkStats::default(),
        }
    }

    /// Receive one frame, validate it and acknowledge it.
    ///
    /// Noise and torn frames are skipped internally; the call only returns
    /// once a complete frame was acknowledged or the context aborted.
    pub fn receive_packet<C: LinkContext + ?Sized>(&mut self, ctx: &C) -> Result<ReceiveOutcome> {
        receive_packet(&mut self.link, &self.config, &mut self.stats, ctx)
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.link
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.link
    }

    /// Consume the receiver and return the transport.
    pub fn into_inner(self) -> T {
        self.link
    }
}

pub(crate) fn receive_packet<T, C>(
    link: &mut T,
    config: &LinkConfig,
    stats: &mut LinkStats,
    ctx: &C,
) -> Result<ReceiveOutcome>
where
    T: ByteTransport + ?Sized,
    C: LinkContext + ?Sized,
{
    let max_len = config.effective_max_encoded_len();
    let mut body = [0u8; MAX_ENCODED_LEN];
    let mut state = State::SeekSentinel { run: 0 };

    let len = loop {
        if ctx.should_abort() {
            stats.resets += 1;
            debug!(?state, "receive aborted");
            return Ok(ReceiveOutcome::Reset);
        }

        let Some(byte) = link.try_recv()? else {
            ctx.yield_now();
            continue;
        };

        state = match state {
            State::SeekSentinel { run } if byte == SENTINEL => {
                if run + 1 == SENTINEL_RUN {
                    State::ReadLength
                } else {
                    State::SeekSentinel { run: run + 1 }
                }
            }
            State::SeekSentinel { .. } => State::SeekSentinel { run: 0 },
            State::ReadLength if byte == SENTINEL => {
                trace!("sentinel in length position; restarting frame");
                State::RESTART
            }
            State::ReadLength => {
                let len = usize::from(byte);
                if len == 0 || len > max_len {
                    stats.rejected_lengths += 1;
                    debug!(len, max_len, "rejecting frame length");
                    State::SeekSentinel { run: 0 }
                } else {
                    State::ReadBody { len, filled: 0 }
                }
            }
            State::ReadBody { filled, .. } if byte == SENTINEL => {
                stats.resyncs += 1;
                debug!(filled, "sentinel inside body; resynchronizing");
                State::RESTART
            }
            State::ReadBody { len, filled } => {
                body[filled] = byte;
                if filled + 1 == len {
                    break len;
                }
                State::ReadBody {
                    len,
                    filled: filled + 1,
                }
            }
        };
    };

    let packet = validate(&body[..len]);
    let ack = if packet.is_some() {
        Ack::Ok
    } else {
        Ack::CrcFail
    };

    loop {
        if ctx.should_abort() {
            stats.resets += 1;
            debug!("receive aborted before acknowledgement");
            return Ok(ReceiveOutcome::Reset);
        }
        if link.try_send(ack.to_byte())? {
            break;
        }
        ctx.yield_now();
    }

    match packet {
        Some(packet) => {
            stats.delivered += 1;
            trace!(
                destination = packet.destination,
                packet_type = packet.packet_type,
                "packet delivered"
            );
            Ok(ReceiveOutcome::Delivered(packet))
        }
        None => {
            stats.checksum_failures += 1;
            Ok(ReceiveOutcome::ChecksumFailed)
        }
    }
}

/// Decode a body and check its embedded checksum.
fn validate(body: &[u8]) -> Option<Packet> {
    let (bytes, len) = match decode(body) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!(error = %err, "undecodable frame body");
            return None;
        }
    };
    if len != PACKET_SIZE {
        debug!(len, "decoded body has wrong length");
        return None;
    }

    let mut crc = Checksum::new();
    crc.update_slice(&bytes[..CHECKSUMMED_LEN]);
    let computed = crc.finish();

    let packet = Packet::from_bytes(&bytes);
    if packet.checksum != computed {
        debug!(expected = packet.checksum, computed, "checksum mismatch");
        return None;
    }
    Some(packet)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use bytes::BytesMut;
    use packlink_frame::{encode_frame, ACK_CRC_FAIL, ACK_OK, FRAME_OVERHEAD};
    use packlink_transport::MemoryLink;

    use super::*;

    /// Aborts as soon as the link runs dry.
    #[derive(Default)]
    struct AbortWhenIdle {
        idle: Cell<bool>,
    }

    impl LinkContext for AbortWhenIdle {
        fn should_abort(&self) -> bool {
            self.idle.get()
        }

        fn yield_now(&self) {
            self.idle.set(true);
        }
    }

    /// Aborts after a fixed number of polls.
    struct AbortAfter {
        remaining: Cell<usize>,
    }

    impl LinkContext for AbortAfter {
        fn should_abort(&self) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return true;
            }
            self.remaining.set(left - 1);
            false
        }
    }

    fn frame(packet: Packet) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(&packet, &mut buf);
        buf.to_vec()
    }

    fn sample() -> Packet {
        Packet::new(0x01, 0x05, [0x10, 0x00, 0x00, 0x00]).sealed()
    }

    fn drain(link: &mut MemoryLink) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(byte) = link.try_recv().unwrap() {
            out.push(byte);
        }
        out
    }

    #[test]
    fn receives_clean_frame_and_acks_ok() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(drain(&mut peer), vec![ACK_OK]);
        assert_eq!(receiver.stats().delivered, 1);
    }

    #[test]
    fn skips_noise_before_frame() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&[0x00, 0x13, 0xFF, 0x42, 0x7E, 0xFF, 0x00]);
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(drain(&mut peer), vec![ACK_OK]);
    }

    #[test]
    fn extra_leading_sentinels_still_sync() {
        let (_peer, link) = MemoryLink::pair();
        link.inject(&[SENTINEL, SENTINEL]);
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();
        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
    }

    #[test]
    fn mid_body_sentinel_restarts_on_following_frame() {
        let (mut peer, link) = MemoryLink::pair();
        let torn = frame(Packet::single_byte(9, 9).sealed());
        // Header plus four body bytes, then the real frame begins.
        link.inject(&torn[..FRAME_OVERHEAD + 4]);
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(drain(&mut peer), vec![ACK_OK]);
        assert_eq!(receiver.stats().resyncs, 1);
    }

    #[test]
    fn torn_frame_alone_is_never_delivered() {
        let (mut peer, link) = MemoryLink::pair();
        let torn = frame(sample());
        link.inject(&torn[..FRAME_OVERHEAD + 5]);
        link.inject(&[SENTINEL, 0x00, 0x01]);

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Reset);
        assert!(drain(&mut peer).is_empty());
    }

    #[test]
    fn corrupted_body_acks_crc_fail() {
        let (mut peer, link) = MemoryLink::pair();
        let mut bytes = frame(sample());
        bytes[FRAME_OVERHEAD + 3] ^= 0x01;
        link.inject(&bytes);

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::ChecksumFailed);
        assert_eq!(drain(&mut peer), vec![ACK_CRC_FAIL]);
        assert_eq!(receiver.stats().checksum_failures, 1);
    }

    #[test]
    fn short_body_is_a_checksum_failure() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&[SENTINEL, SENTINEL, 0x03, 0x00, 0x01, 0x02]);

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::ChecksumFailed);
        assert_eq!(drain(&mut peer), vec![ACK_CRC_FAIL]);
    }

    #[test]
    fn oversized_length_restarts_sync() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&[SENTINEL, SENTINEL, (MAX_ENCODED_LEN + 1) as u8, 0x00, 0x00]);
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(drain(&mut peer), vec![ACK_OK]);
        assert_eq!(receiver.stats().rejected_lengths, 1);
    }

    #[test]
    fn zero_length_restarts_sync() {
        let (_peer, link) = MemoryLink::pair();
        link.inject(&[SENTINEL, SENTINEL, 0x00]);
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();
        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(receiver.stats().rejected_lengths, 1);
    }

    #[test]
    fn configured_length_limit_is_enforced() {
        let (_peer, link) = MemoryLink::pair();
        link.inject(&frame(sample()));

        let config = LinkConfig {
            max_encoded_len: 8,
            ..LinkConfig::default()
        };
        let mut receiver = Receiver::with_config(link, config);
        let outcome = receiver.receive_packet(&AbortWhenIdle::default()).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Reset);
        assert_eq!(receiver.stats().rejected_lengths, 1);
    }

    #[test]
    fn abort_mid_frame_sends_no_ack() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(link);
        let ctx = AbortAfter {
            remaining: Cell::new(6),
        };
        let outcome = receiver.receive_packet(&ctx).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Reset);
        assert!(drain(&mut peer).is_empty());
        assert_eq!(receiver.stats().resets, 1);
    }

    #[test]
    fn abort_before_ack_sends_nothing() {
        let (mut peer, link) = MemoryLink::pair();
        let bytes = frame(sample());
        link.inject(&bytes);

        let mut receiver = Receiver::new(link);
        // One poll per frame byte, then the abort lands before the ack.
        let ctx = AbortAfter {
            remaining: Cell::new(bytes.len()),
        };
        let outcome = receiver.receive_packet(&ctx).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Reset);
        assert!(drain(&mut peer).is_empty());
    }

    /// Refuses the first `refusals` sends, as a full transmit register would.
    struct BusyTx {
        inner: MemoryLink,
        refusals: usize,
    }

    impl ByteTransport for BusyTx {
        fn try_send(&mut self, byte: u8) -> packlink_transport::Result<bool> {
            if self.refusals > 0 {
                self.refusals -= 1;
                return Ok(false);
            }
            self.inner.try_send(byte)
        }

        fn try_recv(&mut self) -> packlink_transport::Result<Option<u8>> {
            self.inner.try_recv()
        }
    }

    #[derive(Default)]
    struct CountYields {
        yields: Cell<usize>,
    }

    impl LinkContext for CountYields {
        fn should_abort(&self) -> bool {
            false
        }

        fn yield_now(&self) {
            self.yields.set(self.yields.get() + 1);
        }
    }

    #[test]
    fn ack_is_retried_while_transport_is_busy() {
        let (mut peer, link) = MemoryLink::pair();
        link.inject(&frame(sample()));

        let mut receiver = Receiver::new(BusyTx {
            inner: link,
            refusals: 5,
        });
        let ctx = CountYields::default();
        let outcome = receiver.receive_packet(&ctx).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Delivered(sample()));
        assert_eq!(ctx.yields.get(), 5);
        assert_eq!(drain(&mut peer), vec![ACK_OK]);
    }

    #[test]
    fn abort_while_ack_is_blocked_returns_reset() {
        let (mut peer, link) = MemoryLink::pair_with_capacity(0);
        let bytes = frame(sample());
        link.inject(&bytes);

        let mut receiver = Receiver::new(link);
        let ctx = AbortAfter {
            remaining: Cell::new(bytes.len() + 40),
        };
        let outcome = receiver.receive_packet(&ctx).unwrap();

        assert_eq!(outcome, ReceiveOutcome::Reset);
        assert_eq!(receiver.stats().resets, 1);
        assert_eq!(receiver.stats().delivered, 0);
        assert!(drain(&mut peer).is_empty());
    }

    #[test]
    fn consecutive_frames_need_consecutive_calls() {
        let (mut peer, link) = MemoryLink::pair();
        let second = Packet::single_byte(0x02, 0xEE).sealed();
        link.inject(&frame(sample()));
        link.inject(&frame(second));

        let mut receiver = Receiver::new(link);
        let ctx = AbortWhenIdle::default();
        assert_eq!(
            receiver.receive_packet(&ctx).unwrap(),
            ReceiveOutcome::Delivered(sample())
        );
        assert_eq!(
            receiver.receive_packet(&ctx).unwrap(),
            ReceiveOutcome::Delivered(second)
        );
        assert_eq!(drain(&mut peer), vec![ACK_OK, ACK_OK]);
    }

    #[test]
    fn closed_link_is_an_error() {
        let (peer, link) = MemoryLink::pair();
        drop(peer);

        let mut receiver = Receiver::new(link);
        let err = receiver
            .receive_packet(&AbortWhenIdle::default())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PeerError::Transport(packlink_transport::TransportError::Closed)
        ));
    }
}
