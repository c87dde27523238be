use std::time::Duration;

use crate::wire::MAX_ENCODED_LEN;

/// Default number of transmissions per packet before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u8 = 3;

/// Default time a sender waits for an acknowledgement byte per attempt.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(100);

/// How a sender behaves while it waits for the acknowledgement byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckWait {
    /// Poll the link and the abort signal only, without handing off to other
    /// cooperative work. Gives the tightest turnaround.
    #[default]
    Spin,
    /// Call the context's yield hook between polls, like every other loop.
    Yield,
}

/// Link policy shared by sender and receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Longest encoded body accepted. Capped at [`MAX_ENCODED_LEN`].
    pub max_encoded_len: usize,
    /// Transmissions per packet. Zero is treated as one.
    pub max_attempts: u8,
    /// Per-attempt acknowledgement timeout. `None` waits until a byte
    /// arrives or the abort signal is raised.
    pub ack_timeout: Option<Duration>,
    pub ack_wait: AckWait,
}

impl LinkConfig {
    /// The body length limit actually enforced.
    pub fn effective_max_encoded_len(&self) -> usize {
        self.max_encoded_len.min(MAX_ENCODED_LEN)
    }

    /// The attempt budget actually used.
    pub fn effective_max_attempts(&self) -> u8 {
        self.max_attempts.max(1)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_encoded_len: MAX_ENCODED_LEN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_timeout: Some(DEFAULT_ACK_TIMEOUT),
            ack_wait: AckWait::Spin,
        }
    }
}
