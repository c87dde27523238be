use packlink_frame::Packet;

/// Result of one [`crate::Receiver::receive_packet`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// A frame passed validation and was acknowledged.
    Delivered(Packet),
    /// The abort signal was raised; any partial frame was dropped.
    Reset,
    /// A complete frame failed validation and was negatively acknowledged.
    /// Its contents are discarded.
    ChecksumFailed,
}

/// Result of one [`crate::Sender::send_packet`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The peer acknowledged the packet on the given attempt (1-based).
    Acknowledged { attempts: u8 },
    /// The abort signal was raised; remaining attempts were abandoned.
    Reset,
    /// Every attempt ended without a positive acknowledgement.
    SendFailed { attempts: u8 },
}

impl SendOutcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, SendOutcome::Acknowledged { .. })
    }
}

impl ReceiveOutcome {
    /// The delivered packet, if any.
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            ReceiveOutcome::Delivered(packet) => Some(packet),
            _ => None,
        }
    }
}
