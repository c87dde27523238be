use std::thread;

use packlink_frame::{LinkConfig, Packet, Payload, SENTINEL};
use packlink_peer::{
    LinkStats, NeverAbort, PeerError, ReceiveOutcome, Receiver, ResetSignal, Sender,
};
use packlink_transport::{ByteTransport, MemoryLink, Result as TransportResult};
use tracing::{debug, info};

use crate::cmd::SelftestArgs;
use crate::exit::{peer_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_selftest, send_outcome_parts, ExchangeRecord, OutputFormat};

/// Offset of the frame byte that gets flipped: the third body byte.
const CORRUPT_OFFSET: usize = 5;

pub fn run(args: SelftestArgs, format: OutputFormat) -> CliResult<i32> {
    if args.count == 0 {
        return Err(CliError::new(USAGE, "--count must be greater than zero"));
    }
    if args.corrupt_every == Some(0) {
        return Err(CliError::new(USAGE, "--corrupt-every must be greater than zero"));
    }

    let (router_end, dispenser_end) = MemoryLink::pair();
    let stop = ResetSignal::new();

    let dispenser = {
        let stop = stop.clone();
        thread::spawn(move || -> Result<(Vec<Packet>, LinkStats), PeerError> {
            let mut receiver = Receiver::new(dispenser_end);
            let mut delivered = Vec::new();
            loop {
                match receiver.receive_packet(&stop)? {
                    ReceiveOutcome::Delivered(packet) => delivered.push(packet),
                    ReceiveOutcome::ChecksumFailed => {}
                    ReceiveOutcome::Reset => break,
                }
            }
            Ok((delivered, *receiver.stats()))
        })
    };

    let ctx = NeverAbort::default();
    let mut sender = Sender::with_config(FaultyLink::new(router_end), sender_config());
    let mut sent = Vec::with_capacity(args.count);
    for index in 0..args.count {
        let packet = sample_packet(index);
        for byte in noise(index, args.noise) {
            sender
                .get_mut()
                .send_blocking(byte)
                .map_err(|err| peer_error("noise write failed", err.into()))?;
        }
        if args.corrupt_every.is_some_and(|every| (index + 1) % every == 0) {
            sender.get_mut().arm();
        }

        let outcome = sender
            .send_packet(&ctx, packet)
            .map_err(|err| peer_error("send failed", err))?;
        debug!(index, ?outcome, "selftest exchange");
        sent.push((packet.sealed(), outcome));
    }

    stop.trigger();
    let (delivered, receiver_stats) = dispenser
        .join()
        .map_err(|_| CliError::new(INTERNAL, "receiver thread panicked"))?
        .map_err(|err| peer_error("receive failed", err))?;

    let exchanges: Vec<ExchangeRecord> = sent
        .iter()
        .enumerate()
        .map(|(index, (packet, outcome))| {
            let (label, attempts) = send_outcome_parts(outcome);
            ExchangeRecord {
                index,
                packet: *packet,
                outcome: label,
                attempts,
                delivered: delivered.contains(packet),
            }
        })
        .collect();

    let passed = delivered.len() == args.count
        && exchanges
            .iter()
            .all(|record| record.delivered && record.outcome == "acknowledged");
    info!(passed, delivered = delivered.len(), "selftest finished");

    print_selftest(&exchanges, sender.stats(), &receiver_stats, passed, format);
    Ok(if passed { SUCCESS } else { DATA_INVALID })
}

/// The receiver thread answers every complete frame, so the sender waits
/// without a deadline and attempt counts do not depend on scheduling.
fn sender_config() -> LinkConfig {
    LinkConfig {
        ack_timeout: None,
        ..LinkConfig::default()
    }
}

fn sample_packet(index: usize) -> Packet {
    let seed = u32::try_from(index).unwrap_or(u32::MAX);
    let packet_type = u8::try_from(index % 4).unwrap_or(0) + 0x05;
    Packet::new(
        0x01,
        packet_type,
        Payload::from_u32(seed.wrapping_mul(0x0101_0101) ^ 0x80FF_00FF),
    )
}

/// Deterministic line noise. Contains lone sentinels but never two in a row
/// and never ends on one, so it cannot swallow the frame that follows.
fn noise(index: usize, len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..len)
        .map(|k| {
            if k % 3 == 1 {
                SENTINEL
            } else {
                ((index * 31 + k * 17) & 0x7F) as u8
            }
        })
        .collect();
    if bytes.last() == Some(&SENTINEL) {
        if let Some(last) = bytes.last_mut() {
            *last = 0x00;
        }
    }
    bytes
}

/// Transport wrapper that can flip one bit in the next outgoing frame.
struct FaultyLink {
    inner: MemoryLink,
    armed: bool,
    frame_pos: usize,
}

impl FaultyLink {
    fn new(inner: MemoryLink) -> Self {
        Self {
            inner,
            armed: false,
            frame_pos: 0,
        }
    }

    /// Corrupt the next frame written through this link.
    fn arm(&mut self) {
        self.armed = true;
        self.frame_pos = 0;
    }

    fn send_blocking(&mut self, byte: u8) -> TransportResult<()> {
        while !self.inner.try_send(byte)? {
            std::hint::spin_loop();
        }
        Ok(())
    }
}

impl ByteTransport for FaultyLink {
    fn try_send(&mut self, byte: u8) -> TransportResult<bool> {
        let mut out = byte;
        if self.armed && self.frame_pos == CORRUPT_OFFSET {
            out ^= 0x02;
        }
        let accepted = self.inner.try_send(out)?;
        if accepted && self.armed {
            self.frame_pos += 1;
            if self.frame_pos > CORRUPT_OFFSET {
                self.armed = false;
            }
        }
        Ok(accepted)
    }

    fn try_recv(&mut self) -> TransportResult<Option<u8>> {
        self.inner.try_recv()
    }

    fn transport_name(&self) -> &'static str {
        "faulty-memory"
    }
}
