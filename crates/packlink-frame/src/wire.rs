use bytes::{BufMut, BytesMut};

use crate::pack7;
use crate::packet::Packet;

/// Frame start marker. Sent twice before every frame, never inside a body.
pub const SENTINEL: u8 = 0xFF;

/// Upper bound on the encoded body length a receiver will accept.
pub const MAX_ENCODED_LEN: usize = 16;

/// Bytes preceding the body: two sentinels and the length byte.
pub const FRAME_OVERHEAD: usize = 3;

/// Acknowledgement byte: checksum matched.
pub const ACK_OK: u8 = 0x00;

/// Acknowledgement byte: checksum mismatch or undecodable body.
pub const ACK_CRC_FAIL: u8 = 0x01;

/// The single byte a receiver answers a complete frame with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ok,
    CrcFail,
}

impl Ack {
    pub const fn to_byte(self) -> u8 {
        match self {
            Ack::Ok => ACK_OK,
            Ack::CrcFail => ACK_CRC_FAIL,
        }
    }

    /// Interpret a received byte. Anything but the two codes is `None`.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ACK_OK => Some(Ack::Ok),
            ACK_CRC_FAIL => Some(Ack::CrcFail),
            _ => None,
        }
    }
}

/// Encode a packet into the wire format, as-is (the checksum is not recomputed).
///
/// Wire format:
/// ```text
/// ┌──────┬──────┬────────┬──────────────────────┐
/// │ 0xFF │ 0xFF │ Length │ 7-bit packed body    │
/// │      │      │ (1B)   │ (Length bytes)       │
/// └──────┴──────┴────────┴──────────────────────┘
/// ```
pub fn encode_frame(packet: &Packet, dst: &mut BytesMut) {
    let body = pack7::encode(&packet.to_bytes());
    dst.reserve(FRAME_OVERHEAD + body.len());
    dst.put_u8(SENTINEL);
    dst.put_u8(SENTINEL);
    dst.put_u8(body.len() as u8);
    dst.put_slice(body.as_slice());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack7::ENCODED_PACKET_LEN;

    #[test]
    fn ack_codes_round_trip() {
        assert_eq!(Ack::from_byte(Ack::Ok.to_byte()), Some(Ack::Ok));
        assert_eq!(Ack::from_byte(Ack::CrcFail.to_byte()), Some(Ack::CrcFail));
        assert_eq!(Ack::from_byte(0x42), None);
        assert_ne!(ACK_OK, ACK_CRC_FAIL);
    }

    #[test]
    fn frame_starts_with_two_sentinels_and_length() {
        let packet = Packet::new(0x01, 0x05, [0x10, 0x00, 0x00, 0x00]).sealed();
        let mut buf = BytesMut::new();
        encode_frame(&packet, &mut buf);

        assert_eq!(buf.len(), FRAME_OVERHEAD + ENCODED_PACKET_LEN);
        assert_eq!(&buf[..3], &[SENTINEL, SENTINEL, ENCODED_PACKET_LEN as u8]);
        assert!(!buf[3..].contains(&SENTINEL));
    }

    #[test]
    fn length_byte_is_never_the_sentinel() {
        assert!(MAX_ENCODED_LEN < SENTINEL as usize);
    }

    #[test]
    fn frames_append() {
        let mut buf = BytesMut::new();
        encode_frame(&Packet::single_byte(1, 2).sealed(), &mut buf);
        encode_frame(&Packet::single_byte(3, 4).sealed(), &mut buf);
        assert_eq!(buf.len(), 2 * (FRAME_OVERHEAD + ENCODED_PACKET_LEN));
        assert_eq!(buf[FRAME_OVERHEAD + ENCODED_PACKET_LEN], SENTINEL);
    }
}
