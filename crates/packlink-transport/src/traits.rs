use crate::error::Result;

/// Non-blocking single-byte access to a physical or simulated link.
///
/// Both operations return immediately. `Ok(false)` / `Ok(None)` mean "not
/// right now" and the caller is expected to poll again; `Err` means the link
/// itself is unusable.
pub trait ByteTransport {
    /// Offer one byte to the transmit side.
    ///
    /// Returns `Ok(true)` iff the byte was accepted during this call.
    fn try_send(&mut self, byte: u8) -> Result<bool>;

    /// Take one byte from the receive side, if one is available.
    fn try_recv(&mut self) -> Result<Option<u8>>;

    /// Human-readable transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "byte-transport"
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn try_send(&mut self, byte: u8) -> Result<bool> {
        (**self).try_send(byte)
    }

    fn try_recv(&mut self) -> Result<Option<u8>> {
        (**self).try_recv()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn try_send(&mut self, byte: u8) -> Result<bool> {
        (**self).try_send(byte)
    }

    fn try_recv(&mut self) -> Result<Option<u8>> {
        (**self).try_recv()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
