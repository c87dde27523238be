use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use packlink_frame::LinkConfig;
use packlink_peer::{Idle, PeerError, ReceiveOutcome, Receiver, ResetSignal};
use packlink_transport::{ByteTransport, TransportError, UnixLink};
use tracing::{info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{
    peer_error, receive_outcome_code, transport_error, CliError, CliResult, INTERNAL, RESET,
    SUCCESS, USAGE,
};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_len == 0 {
        return Err(CliError::new(USAGE, "--max-len must be greater than zero"));
    }
    let config = LinkConfig {
        max_encoded_len: args.max_len,
        ..LinkConfig::default()
    };

    let link = UnixLink::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    let signal = ResetSignal::with_idle(Idle::Sleep(Duration::from_micros(250)));
    install_ctrlc_handler(signal.clone())?;

    let mut printed = 0usize;
    while !signal.is_set() {
        let stream = link
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        info!(
            path = ?link.path(),
            transport = stream.transport_name(),
            "link peer connected"
        );

        let mut receiver = Receiver::with_config(stream, config.clone());
        loop {
            match receiver.receive_packet(&signal) {
                Ok(ReceiveOutcome::Delivered(packet)) => {
                    if args.dest.is_some_and(|dest| dest != packet.destination) {
                        continue;
                    }
                    print_packet(&packet, format);
                    printed = printed.saturating_add(1);
                    if args.count.is_some_and(|count| printed >= count) {
                        return Ok(SUCCESS);
                    }
                }
                Ok(ReceiveOutcome::ChecksumFailed) => {
                    warn!("dropped corrupted frame");
                }
                Ok(outcome @ ReceiveOutcome::Reset) => {
                    info!(stats = ?receiver.stats(), "listener reset");
                    return Ok(receive_outcome_code(&outcome));
                }
                Err(PeerError::Transport(TransportError::Closed)) => {
                    info!(stats = ?receiver.stats(), "link peer disconnected");
                    break;
                }
                Err(err) => return Err(peer_error("receive failed", err)),
            }
        }
    }

    Ok(RESET)
}

/// First Ctrl-C raises the reset line; a second one exits outright, which
/// also covers a listener still blocked waiting for a peer.
pub(crate) fn install_ctrlc_handler(signal: ResetSignal) -> CliResult<()> {
    let pressed = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler(move || {
        if pressed.swap(true, Ordering::SeqCst) {
            std::process::exit(RESET);
        }
        signal.trigger();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
