//! Transport layer for ASCII Arena.
//!
//! This crate moves bytes between TCP sockets and the game logic thread:
//!
//! - [`Reactor`] owns a readiness selector and the registry of live
//!   connections. One thread polls for read-readiness, one thread drains
//!   outbound packages and writes them.
//! - [`PackageQueue`] is the bridge between the reactor and the logic thread:
//!   one inbound FIFO (network → logic) and one outbound FIFO (logic → network).
//! - [`Framing`] is the collaborator that splits raw bytes into messages and
//!   serializes messages back into bytes. The protocol crate provides one.
//!
//! ```text
//! socket ─→ Reactor (read) ─→ Framing::split ─→ inbound queue ─→ logic
//! logic ─→ outbound queue ─→ Reactor (write) ─→ Framing::serialize ─→ socket
//! ```

mod error;
mod framing;
mod queue;
mod reactor;

pub use error::TransportError;
pub use framing::Framing;
pub use queue::{InputPack, OutputPack, PackageQueue};
pub use reactor::{Listener, Reactor, BLOCKING_TIME, MAX_BUFFER_SIZE};

use std::fmt;

/// Opaque handle to one connected peer.
///
/// Endpoints are issued by the [`Reactor`] when a connection is accepted or
/// opened and are never reused while the process runs. They are cheap to copy
/// and are what the game logic uses to address outbound packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(u64);

impl Endpoint {
    /// Creates an `Endpoint` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}
