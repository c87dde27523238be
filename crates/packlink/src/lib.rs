//! Acknowledged packet exchange over a point-to-point serial link.
//!
//! packlink moves fixed 8-byte packets between two nodes, typically a router
//! and a dispenser, over a byte-at-a-time transport. Frames are
//! sentinel-delimited and 7-bit packed, each packet carries a CRC-16, and
//! every frame is answered by a one-byte acknowledgement with bounded
//! retries on the sending side.
//!
//! # Crate Structure
//!
//! - [`transport`]: non-blocking byte transports (in-memory pair, Unix sockets)
//! - [`frame`]: packet layout, checksum, 7-bit codec and wire constants
//! - [`peer`]: cooperative sender, receiver and node state machines

/// Re-export transport types.
pub mod transport {
    pub use packlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use packlink_frame::*;
}

/// Re-export peer types.
pub mod peer {
    pub use packlink_peer::*;
}
