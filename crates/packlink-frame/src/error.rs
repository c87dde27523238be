/// Errors produced by the packing codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// An encoded byte has its high bit set, which the encoder never emits.
    #[error("invalid encoded byte 0x{value:02X} at offset {offset}")]
    InvalidByte { offset: usize, value: u8 },

    /// A group header flags high bits for bytes the group does not contain.
    #[error("group header at offset {offset} has stray high bits")]
    StrayHighBits { offset: usize },

    /// A trailing group holds a header but no data bytes.
    #[error("truncated group at offset {offset}")]
    TruncatedGroup { offset: usize },

    /// The decoded bytes do not fit the destination buffer.
    #[error("decoded data exceeds {capacity} bytes")]
    Overflow { capacity: usize },

    /// The destination buffer cannot hold the encoded output.
    #[error("output buffer too small ({needed} bytes needed, {capacity} available)")]
    BufferTooSmall { needed: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
