/// Errors that can occur while exchanging packets.
///
/// Protocol results (checksum failures, exhausted retries, resets) are not
/// errors; they are reported as [`crate::ReceiveOutcome`] and
/// [`crate::SendOutcome`]. This type only covers a link that stopped working.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] packlink_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, PeerError>;
