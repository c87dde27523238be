//! Line settings for hardware-backed links.
//!
//! The protocol itself is rate-agnostic; these values only matter to
//! transports that drive a real UART. They are fixed policy, not negotiated.

use std::fmt;

/// Bit rate both nodes are built for.
pub const DEFAULT_BAUD: u32 = 38_400;

/// Parity mode of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Serial line configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl LinkSettings {
    /// 38400 baud, 8 data bits, no parity, 1 stop bit.
    pub const SERIAL_8N1: Self = Self {
        baud: DEFAULT_BAUD,
        data_bits: 8,
        stop_bits: 1,
        parity: Parity::None,
    };

    /// Bits on the wire per transmitted byte, including start and stop bits.
    pub fn bits_per_byte(&self) -> u32 {
        let parity = if self.parity == Parity::None { 0 } else { 1 };
        1 + u32::from(self.data_bits) + parity + u32::from(self.stop_bits)
    }

    /// Time needed to clock `bytes` bytes out at this rate, in microseconds.
    pub fn transmit_micros(&self, bytes: usize) -> u64 {
        let bits = bytes as u64 * u64::from(self.bits_per_byte());
        bits * 1_000_000 / u64::from(self.baud.max(1))
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self::SERIAL_8N1
    }
}

impl fmt::Display for LinkSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud, self.data_bits, parity, self.stop_bits
        )
    }
}
