use std::time::Duration;

use packlink_frame::{AckWait, LinkConfig, Packet, Payload, PAYLOAD_SIZE};
use packlink_peer::{ResetSignal, Sender};
use packlink_transport::UnixLink;
use tracing::debug;

use crate::cmd::listen::install_ctrlc_handler;
use crate::cmd::SendArgs;
use crate::exit::{peer_error, send_outcome_code, transport_error, CliError, CliResult, USAGE};
use crate::output::{print_send_outcome, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let packet = resolve_packet(&args)?;
    let ack_timeout = if args.no_ack_timeout {
        None
    } else {
        Some(parse_duration(&args.ack_timeout)?)
    };
    let config = LinkConfig {
        max_attempts: args.attempts,
        ack_timeout,
        ack_wait: if args.yield_on_ack {
            AckWait::Yield
        } else {
            AckWait::Spin
        },
        ..LinkConfig::default()
    };

    let stream =
        UnixLink::connect(&args.path).map_err(|err| transport_error("connect failed", err))?;
    let signal = ResetSignal::new();
    install_ctrlc_handler(signal.clone())?;

    let mut sender = Sender::with_config(stream, config);
    let outcome = sender
        .send_packet(&signal, packet)
        .map_err(|err| peer_error("send failed", err))?;
    debug!(?outcome, stats = ?sender.stats(), "send finished");

    print_send_outcome(&packet.sealed(), &outcome, sender.stats(), format);
    Ok(send_outcome_code(&outcome))
}

fn resolve_packet(args: &SendArgs) -> CliResult<Packet> {
    let payload = if let Some(value) = args.value {
        Payload::from_u8(value)
    } else if let Some(text) = &args.payload {
        parse_payload_hex(text)?
    } else if let Some(value) = args.u32 {
        Payload::from_u32(value)
    } else {
        Payload::ZERO
    };
    Ok(Packet::new(args.dest, args.packet_type, payload))
}

fn parse_payload_hex(input: &str) -> CliResult<Payload> {
    let digits = input.trim().trim_start_matches("0x");
    if digits.len() != PAYLOAD_SIZE * 2 || !digits.is_ascii() {
        return Err(CliError::new(
            USAGE,
            format!("--payload must be {} hex digits: {input}", PAYLOAD_SIZE * 2),
        ));
    }

    let mut bytes = [0u8; PAYLOAD_SIZE];
    for (slot, pair) in bytes.iter_mut().zip(digits.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(pair)
            .map_err(|_| CliError::new(USAGE, format!("invalid hex payload: {input}")))?;
        *slot = u8::from_str_radix(pair, 16)
            .map_err(|_| CliError::new(USAGE, format!("invalid hex payload: {input}")))?;
    }
    Ok(Payload::new(bytes))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, true)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
