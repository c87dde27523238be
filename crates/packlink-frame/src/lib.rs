//! Packet layout and sentinel framing for a point-to-point serial link.
//!
//! Every packet travels in a frame made of:
//! - two `0xFF` sentinel bytes for stream synchronization
//! - one length byte counting the encoded body bytes
//! - the 7-bit packed body, which never contains `0xFF`
//!
//! The receiver answers each complete body with a single acknowledgement byte.

pub mod checksum;
pub mod config;
pub mod error;
pub mod pack7;
pub mod packet;
pub mod wire;

pub use checksum::{crc16, Checksum};
pub use config::{AckWait, LinkConfig, DEFAULT_ACK_TIMEOUT, DEFAULT_MAX_ATTEMPTS};
pub use error::{CodecError, Result};
pub use pack7::{decode, encode, EncodedBody, ENCODED_PACKET_LEN};
pub use packet::{Packet, Payload, CHECKSUMMED_LEN, PACKET_SIZE, PAYLOAD_SIZE};
pub use wire::{encode_frame, Ack, ACK_CRC_FAIL, ACK_OK, FRAME_OVERHEAD, MAX_ENCODED_LEN, SENTINEL};
