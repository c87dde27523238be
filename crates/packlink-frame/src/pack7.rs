//! 7-bit packing codec.
//!
//! Source bytes are taken in groups of up to seven. Each group is emitted as
//! one header byte holding the high bit of every byte in the group (bit `i`
//! for byte `i`), followed by the group's bytes with their high bit cleared.
//! Every encoded byte is therefore below `0x80` and can never collide with the
//! frame sentinel.
//!
//! ```text
//! src:  b0 b1 b2 b3 b4 b5 b6 | b7
//! dst:  H0 b0' b1' ... b6'   | H1 b7'
//! ```

use crate::error::{CodecError, Result};
use crate::packet::PACKET_SIZE;
use crate::wire::MAX_ENCODED_LEN;

const GROUP: usize = 7;
const LOW_BITS: u8 = 0x7F;

/// Encoded length of a full packet.
pub const ENCODED_PACKET_LEN: usize = encoded_len(PACKET_SIZE);

/// Number of bytes [`encode_into`] produces for `len` source bytes.
pub const fn encoded_len(len: usize) -> usize {
    len + len.div_ceil(GROUP)
}

/// An encoded packet body held in a fixed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedBody {
    buf: [u8; MAX_ENCODED_LEN],
    len: usize,
}

impl EncodedBody {
    /// The encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encode a packet's 8 bytes.
pub fn encode(src: &[u8; PACKET_SIZE]) -> EncodedBody {
    let mut buf = [0u8; MAX_ENCODED_LEN];
    let mut len = 0;
    for group in src.chunks(GROUP) {
        len += encode_group(group, &mut buf[len..]);
    }
    EncodedBody { buf, len }
}

/// Encode an arbitrary byte slice into `dst`, returning the encoded length.
pub fn encode_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let needed = encoded_len(src.len());
    if dst.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            capacity: dst.len(),
        });
    }
    let mut len = 0;
    for group in src.chunks(GROUP) {
        len += encode_group(group, &mut dst[len..]);
    }
    Ok(len)
}

fn encode_group(group: &[u8], dst: &mut [u8]) -> usize {
    let mut header = 0u8;
    for (i, byte) in group.iter().enumerate() {
        header |= (byte >> 7) << i;
        dst[i + 1] = byte & LOW_BITS;
    }
    dst[0] = header;
    group.len() + 1
}

/// Decode an encoded packet body.
///
/// Returns the decoded buffer and how many of its bytes were recovered.
/// Bodies that decode to fewer than 8 bytes leave the tail zeroed; bodies
/// that would decode to more are rejected.
pub fn decode(src: &[u8]) -> Result<([u8; PACKET_SIZE], usize)> {
    let mut dst = [0u8; PACKET_SIZE];
    let len = decode_into(src, &mut dst)?;
    Ok((dst, len))
}

/// Decode `src` into `dst`, returning the number of bytes written.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if let Some(offset) = src.iter().position(|byte| byte & !LOW_BITS != 0) {
        return Err(CodecError::InvalidByte {
            offset,
            value: src[offset],
        });
    }

    let capacity = dst.len();
    let mut written = 0;
    for (index, group) in src.chunks(GROUP + 1).enumerate() {
        let offset = index * (GROUP + 1);
        let (header, data) = match group.split_first() {
            Some((header, data)) if !data.is_empty() => (*header, data),
            _ => return Err(CodecError::TruncatedGroup { offset }),
        };
        if u16::from(header) >> data.len() != 0 {
            return Err(CodecError::StrayHighBits { offset });
        }
        for (i, byte) in data.iter().enumerate() {
            let slot = dst
                .get_mut(written)
                .ok_or(CodecError::Overflow { capacity })?;
            *slot = byte | (((header >> i) & 1) << 7);
            written += 1;
        }
    }
    Ok(written)
}
