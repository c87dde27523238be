use std::time::Instant;

use bytes::BytesMut;
use packlink_frame::{
    encode_frame, Ack, AckWait, LinkConfig, Packet, FRAME_OVERHEAD, MAX_ENCODED_LEN,
};
use packlink_transport::ByteTransport;
use tracing::{debug, trace, warn};

use crate::context::LinkContext;
use crate::error::Result;
use crate::outcome::SendOutcome;
use crate::stats::LinkStats;

/// Sends packets over a byte transport and waits for acknowledgement.
pub struct Sender<T> {
    link: T,
    config: LinkConfig,
    stats: LinkStats,
    frame: BytesMut,
}

enum AckPoll {
    Byte(u8),
    TimedOut,
    Reset,
}

impl<T: ByteTransport> Sender<T> {
    /// Create a sender with the default link policy.
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

    /// Checksum, frame and transmit a packet until it is acknowledged, the
    /// attempt budget runs out, or the context aborts.
    pub fn send_packet<C: LinkContext + ?Sized>(
        &mut self,
        ctx: &C,
        packet: Packet,
    ) -> Result<SendOutcome> {
        send_packet(
            &mut self.link,
            &self.config,
            &mut self.stats,
            &mut self.frame,
            ctx,
            packet,
        )
    }

    /// Send a packet for destination 0 carrying a single payload byte.
    pub fn send_single_byte<C: LinkContext + ?Sized>(
        &mut self,
        ctx: &C,
        packet_type: u8,
        value: u8,
    ) -> Result<SendOutcome> {
        self.send_packet(ctx, Packet::single_byte(packet_type, value))
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

    /// Consume the sender and return the transport.
    pub fn into_inner(self) -> T {
        self.link
    }
}

pub(crate) fn send_packet<T, C>(
    link: &mut T,
    config: &LinkConfig,
    stats: &mut LinkStats,
    frame: &mut BytesMut,
    ctx: &C,
    mut packet: Packet,
) -> Result<SendOutcome>
where
    T: ByteTransport + ?Sized,
    C: LinkContext + ?Sized,
{
    packet.seal();
    frame.clear();
    encode_frame(&packet, frame);

    let max_attempts = config.effective_max_attempts();
    for attempt in 1..=max_attempts {
        if ctx.should_abort() {
            stats.resets += 1;
            debug!(attempt, "send aborted");
            return Ok(SendOutcome::Reset);
        }

        // A late ack from an earlier exchange must not answer this attempt.
        if let Some(stray) = link.try_recv()? {
            stats.stray_bytes += 1;
            trace!(stray, "discarded stray byte before transmit");
        }

        stats.attempts += 1;
        transmit(link, frame, ctx)?;

        match await_ack(link, config, ctx)? {
            AckPoll::Reset => {
                stats.resets += 1;
                debug!(attempt, "send aborted while awaiting ack");
                return Ok(SendOutcome::Reset);
            }
            AckPoll::Byte(code) => match Ack::from_byte(code) {
                Some(Ack::Ok) => {
                    stats.acknowledged += 1;
                    trace!(attempt, "packet acknowledged");
                    return Ok(SendOutcome::Acknowledged { attempts: attempt });
                }
                Some(Ack::CrcFail) => {
                    stats.nacks += 1;
                    debug!(attempt, "peer reported checksum failure");
                }
                None => {
                    stats.nacks += 1;
                    debug!(attempt, code, "unrecognized acknowledgement byte");
                }
            },
            AckPoll::TimedOut => {
                stats.ack_timeouts += 1;
                debug!(attempt, "no acknowledgement before timeout");
            }
        }
    }

    stats.send_failures += 1;
    warn!(
        attempts = max_attempts,
        packet_type = packet.packet_type,
        "giving up on packet"
    );
    Ok(SendOutcome::SendFailed {
        attempts: max_attempts,
    })
}

/// Push every frame byte out, yielding while the transport is full.
///
/// Not interruptible by abort: a frame is either sent whole or the link fails.
fn transmit<T, C>(link: &mut T, frame: &[u8], ctx: &C) -> Result<()>
where
    T: ByteTransport + ?Sized,
    C: LinkContext + ?Sized,
{
    for byte in frame {
        while !link.try_send(*byte)? {
            ctx.yield_now();
        }
    }
    Ok(())
}

fn await_ack<T, C>(link: &mut T, config: &LinkConfig, ctx: &C) -> Result<AckPoll>
where
    T: ByteTransport + ?Sized,
    C: LinkContext + ?Sized,
{
    let deadline = config.ack_timeout.map(|timeout| Instant::now() + timeout);
    loop {
        if ctx.should_abort() {
            return Ok(AckPoll::Reset);
        }
        if let Some(byte) = link.try_recv()? {
            return Ok(AckPoll::Byte(byte));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(AckPoll::TimedOut);
        }
        match config.ack_wait {
            AckWait::Spin => std::hint::spin_loop(),
            AckWait::Yield => ctx.yield_now(),
        }
    }
}
