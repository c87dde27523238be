use std::fmt;
use std::io;

use packlink_peer::{PeerError, ReceiveOutcome, SendOutcome};
use packlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;
/// Operation ended by the reset line (128 + SIGINT).
pub const RESET: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn peer_error(context: &str, err: PeerError) -> CliError {
    match err {
        PeerError::Transport(err) => transport_error(context, err),
    }
}

pub fn send_outcome_code(outcome: &SendOutcome) -> i32 {
    match outcome {
        SendOutcome::Acknowledged { .. } => SUCCESS,
        SendOutcome::SendFailed { .. } => DATA_INVALID,
        SendOutcome::Reset => RESET,
    }
}

pub fn receive_outcome_code(outcome: &ReceiveOutcome) -> i32 {
    match outcome {
        ReceiveOutcome::Delivered(_) => SUCCESS,
        ReceiveOutcome::ChecksumFailed => DATA_INVALID,
        ReceiveOutcome::Reset => RESET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packlink_frame::Packet;

    #[test]
    fn outcomes_map_to_exit_codes() {
        assert_eq!(send_outcome_code(&SendOutcome::Acknowledged { attempts: 2 }), SUCCESS);
        assert_eq!(send_outcome_code(&SendOutcome::SendFailed { attempts: 3 }), DATA_INVALID);
        assert_eq!(send_outcome_code(&SendOutcome::Reset), RESET);
        assert_eq!(
            receive_outcome_code(&ReceiveOutcome::Delivered(Packet::default())),
            SUCCESS
        );
        assert_eq!(receive_outcome_code(&ReceiveOutcome::ChecksumFailed), DATA_INVALID);
    }

    #[test]
    fn closed_link_is_a_transport_error() {
        let err = peer_error("receive failed", PeerError::Transport(TransportError::Closed));
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert_eq!(err.to_string(), "receive failed: link closed");
    }

    #[test]
    fn refused_connection_is_a_plain_failure() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                path: "/tmp/nowhere.sock".into(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        );
        assert_eq!(err.code, FAILURE);
    }
}
