//! Non-blocking single-byte transport abstraction.
//!
//! The packet protocol never blocks on the wire: it polls for one byte at a
//! time and yields when nothing is ready. This crate provides that contract
//! and a few links that honor it:
//! - [`MemoryLink`]: an in-process pair, used for simulation and tests
//! - [`UnixLink`]: a Unix domain socket standing in for the serial wire
//!   between two processes (unix only)
//!
//! This is the lowest layer of packlink. Everything else builds on top of
//! the [`ByteTransport`] trait provided here.

pub mod error;
pub mod memory;
pub mod settings;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::MemoryLink;
pub use settings::{LinkSettings, Parity, DEFAULT_BAUD};
pub use traits::ByteTransport;

#[cfg(unix)]
pub use uds::{LinkStream, UnixLink};
