use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Size of a packet before encoding: destination, type, payload, checksum.
pub const PACKET_SIZE: usize = 8;

/// Size of the payload field.
pub const PAYLOAD_SIZE: usize = 4;

/// Number of leading packet bytes covered by the checksum.
pub const CHECKSUMMED_LEN: usize = PACKET_SIZE - 2;

/// Four payload bytes with several typed views over the same storage.
///
/// Multi-byte views are little-endian, the byte order of both nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Payload([u8; PAYLOAD_SIZE]);

impl Payload {
    /// All-zero payload.
    pub const ZERO: Self = Self([0; PAYLOAD_SIZE]);

    /// Payload from raw bytes.
    pub const fn new(bytes: [u8; PAYLOAD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Payload carrying one byte in position 0; the rest is zero.
    pub const fn from_u8(value: u8) -> Self {
        Self([value, 0, 0, 0])
    }

    pub fn from_u16s(values: [u16; 2]) -> Self {
        let [a0, a1] = values[0].to_le_bytes();
        let [b0, b1] = values[1].to_le_bytes();
        Self([a0, a1, b0, b1])
    }

    pub fn from_u32(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    pub fn from_i32(value: i32) -> Self {
        Self(value.to_le_bytes())
    }

    /// Raw byte view.
    pub const fn bytes(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.0
    }

    /// Mutable raw byte view.
    pub fn bytes_mut(&mut self) -> &mut [u8; PAYLOAD_SIZE] {
        &mut self.0
    }

    pub fn u8_at(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn u16s(&self) -> [u16; 2] {
        [
            u16::from_le_bytes([self.0[0], self.0[1]]),
            u16::from_le_bytes([self.0[2], self.0[3]]),
        ]
    }

    pub fn u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub fn i32(&self) -> i32 {
        i32::from_le_bytes(self.0)
    }
}

impl From<[u8; PAYLOAD_SIZE]> for Payload {
    fn from(bytes: [u8; PAYLOAD_SIZE]) -> Self {
        Self(bytes)
    }
}

/// The fixed-size message exchanged between the two nodes.
///
/// Byte layout, before encoding:
/// ```text
/// ┌─────────────┬──────┬───────────────┬──────────────────┐
/// │ Destination │ Type │ Payload (4B)  │ Checksum (2B LE) │
/// └─────────────┴──────┴───────────────┴──────────────────┘
/// ```
/// The checksum covers the first six bytes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Packet {
    /// Destination node id.
    pub destination: u8,
    /// Application-defined message kind.
    #[serde(rename = "type")]
    pub packet_type: u8,
    pub payload: Payload,
    pub checksum: u16,
}

impl Packet {
    /// Build a packet. The checksum is left at zero until [`Packet::seal`].
    pub fn new(destination: u8, packet_type: u8, payload: impl Into<Payload>) -> Self {
        Self {
            destination,
            packet_type,
            payload: payload.into(),
            checksum: 0,
        }
    }

    /// A packet for destination 0 whose payload is a single byte.
    pub fn single_byte(packet_type: u8, value: u8) -> Self {
        Self::new(0, packet_type, Payload::from_u8(value))
    }

    /// Checksum over destination, type and the four payload bytes, in that order.
    pub fn compute_checksum(&self) -> u16 {
        let mut crc = Checksum::new();
        crc.update(self.destination);
        crc.update(self.packet_type);
        for byte in self.payload.bytes() {
            crc.update(*byte);
        }
        crc.finish()
    }

    /// Compute and store the checksum.
    pub fn seal(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Builder-style [`Packet::seal`].
    pub fn sealed(mut self) -> Self {
        self.seal();
        self
    }

    /// Whether the stored checksum matches the packet contents.
    pub fn verify(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Serialize into the 8-byte pre-encoding layout.
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let p = self.payload.bytes();
        let [c0, c1] = self.checksum.to_le_bytes();
        [
            self.destination,
            self.packet_type,
            p[0],
            p[1],
            p[2],
            p[3],
            c0,
            c1,
        ]
    }

    /// Parse the 8-byte pre-encoding layout. No checksum validation happens here.
    pub fn from_bytes(bytes: &[u8; PACKET_SIZE]) -> Self {
        Self {
            destination: bytes[0],
            packet_type: bytes[1],
            payload: Payload::new([bytes[2], bytes[3], bytes[4], bytes[5]]),
            checksum: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }
}
