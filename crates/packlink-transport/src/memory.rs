use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

#[derive(Debug, Default)]
struct Lane {
    queue: VecDeque<u8>,
    capacity: Option<usize>,
    closed: bool,
}

/// One end of an in-process, full-duplex byte link.
///
/// Created in connected pairs with [`MemoryLink::pair`]. Each direction is a
/// FIFO lane shared between the two ends, so the ends can live on different
/// threads. Dropping either end closes both lanes; the peer then sees
/// [`TransportError::Closed`] once it has drained what was already queued.
#[derive(Debug)]
pub struct MemoryLink {
    tx: Arc<Mutex<Lane>>,
    rx: Arc<Mutex<Lane>>,
}

impl MemoryLink {
    /// Create a connected pair with unbounded lanes.
    pub fn pair() -> (Self, Self) {
        Self::build_pair(None)
    }

    /// Create a connected pair whose lanes hold at most `capacity` bytes.
    ///
    /// A full lane makes `try_send` report "not now", like a UART whose
    /// transmit register has not drained yet.
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        Self::build_pair(Some(capacity))
    }

    fn build_pair(capacity: Option<usize>) -> (Self, Self) {
        let a_to_b = Arc::new(Mutex::new(Lane {
            capacity,
            ..Lane::default()
        }));
        let b_to_a = Arc::new(Mutex::new(Lane {
            capacity,
            ..Lane::default()
        }));
        let a = Self {
            tx: Arc::clone(&a_to_b),
            rx: Arc::clone(&b_to_a),
        };
        let b = Self {
            tx: b_to_a,
            rx: a_to_b,
        };
        (a, b)
    }

    /// Queue bytes on this end's receive lane as if they arrived on the wire.
    ///
    /// Capacity limits do not apply; this is how tests inject line noise.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.rx).queue.extend(bytes.iter().copied());
    }

    /// Number of bytes waiting to be received on this end.
    pub fn pending(&self) -> usize {
        lock(&self.rx).queue.len()
    }

    /// Number of bytes sent by this end that the peer has not taken yet.
    pub fn in_flight(&self) -> usize {
        lock(&self.tx).queue.len()
    }

    /// Close both directions.
    pub fn close(&self) {
        lock(&self.tx).closed = true;
        lock(&self.rx).closed = true;
    }
}

impl ByteTransport for MemoryLink {
    fn try_send(&mut self, byte: u8) -> Result<bool> {
        let mut lane = lock(&self.tx);
        if lane.closed {
            return Err(TransportError::Closed);
        }
        if lane.capacity.is_some_and(|cap| lane.queue.len() >= cap) {
            return Ok(false);
        }
        lane.queue.push_back(byte);
        Ok(true)
    }

    fn try_recv(&mut self) -> Result<Option<u8>> {
        let mut lane = lock(&self.rx);
        match lane.queue.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None if lane.closed => Err(TransportError::Closed),
            None => Ok(None),
        }
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock(lane: &Mutex<Lane>) -> MutexGuard<'_, Lane> {
    lane.lock().unwrap_or_else(PoisonError::into_inner)
}
