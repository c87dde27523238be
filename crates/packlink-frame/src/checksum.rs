//! CRC-16 used to protect packets.
//!
//! The algorithm is CRC-16/ARC (polynomial 0x8005 reflected, initial value
//! zero, no final xor): the update both node firmwares run byte by byte.

use crc::{Crc, Digest, CRC_16_ARC};

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Running checksum, fed one byte at a time.
pub struct Checksum {
    digest: Digest<'static, u16>,
}

impl Checksum {
    /// Start a new checksum from the zero register.
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
        }
    }

    /// Fold one byte into the running value.
    pub fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    /// Fold a run of bytes into the running value.
    pub fn update_slice(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// The checksum of everything fed so far.
    pub fn finish(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checksum").finish_non_exhaustive()
    }
}

/// One-shot checksum of a byte slice.
pub fn crc16(bytes: &[u8]) -> u16 {
    CRC16.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value_matches_catalog() {
        assert_eq!(crc16(b"123456789"), 0xBB3D);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(crc16(&[]), 0);
        assert_eq!(Checksum::new().finish(), 0);
    }

    #[test]
    fn byte_by_byte_matches_one_shot() {
        let data = [0x01, 0x05, 0x10, 0x00, 0x00, 0x00];
        let mut running = Checksum::new();
        for byte in data {
            running.update(byte);
        }
        assert_eq!(running.finish(), crc16(&data));
    }

    #[test]
    fn slice_update_matches_byte_update() {
        let mut a = Checksum::new();
        a.update_slice(b"dispense");
        let mut b = Checksum::new();
        for byte in b"dispense" {
            b.update(*byte);
        }
        assert_eq!(a.finish(), b.finish());
    }
}
