//! Packet exchange between two nodes on one serial link.
//!
//! A [`Sender`] frames a packet, transmits it and waits for a single
//! acknowledgement byte, retrying a bounded number of times. A [`Receiver`]
//! hunts for the frame sentinels, reads and validates one body, and answers
//! with that acknowledgement byte.
//!
//! Both are cooperative: every polling loop consults a [`LinkContext`] so the
//! caller can abandon the exchange at any moment and share the thread with
//! other work.

pub mod context;
pub mod error;
pub mod node;
pub mod outcome;
pub mod receiver;
pub mod sender;
pub mod stats;

pub use context::{Idle, LinkContext, NeverAbort, ResetSignal};
pub use error::{PeerError, Result};
pub use node::Node;
pub use outcome::{ReceiveOutcome, SendOutcome};
pub use receiver::Receiver;
pub use sender::Sender;
pub use stats::LinkStats;
