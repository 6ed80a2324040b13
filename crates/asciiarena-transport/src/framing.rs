//! The framing collaborator used by the [`Reactor`](crate::Reactor).
//!
//! The reactor knows nothing about messages. It hands raw bytes to a
//! `Framing` implementation and gets back zero or more decoded messages, and
//! it asks the same implementation to serialize outbound messages once per
//! package. TCP is a byte stream, so an implementation usually keeps a
//! partial-frame buffer per endpoint; [`untrack`](Framing::untrack) releases
//! it when the endpoint goes away.

use crate::{Endpoint, TransportError};

/// Splits inbound bytes into messages and serializes outbound messages.
///
/// The reactor calls `split` from its read thread and `serialize` from its
/// write thread, always under a lock, so implementations can use `&mut self`
/// freely.
pub trait Framing: Send + 'static {
    /// The message type decoded from the wire.
    type Inbound: Send + 'static;
    /// The message type encoded onto the wire.
    type Outbound: Send + 'static;

    /// Appends `data` received from `endpoint` and returns every message that
    /// is now complete, in receive order.
    fn split(&mut self, data: &[u8], endpoint: Endpoint) -> Vec<Self::Inbound>;

    /// Serializes one outbound message into the bytes to send.
    fn serialize(&mut self, message: &Self::Outbound) -> Result<Vec<u8>, TransportError>;

    /// Forgets any state kept for `endpoint`.
    fn untrack(&mut self, endpoint: Endpoint);
}
