//! Length-prefixed framing over TCP.
//!
//! Every frame on the wire is a 4-byte big-endian body length followed by
//! the body produced by a [`Codec`]:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ len: u32 BE  │ body (len bytes)             │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! TCP delivers a byte stream, so a single read may hold half a frame or
//! several frames. [`LengthPrefixed`] keeps one partial buffer per endpoint
//! and only hands complete bodies to the codec.
//!
//! A header announcing more than [`MAX_FRAME_SIZE`] bytes is not buffered:
//! its whole body is skipped, however many reads it spans, and decoding
//! resumes at the header that follows it.

use std::collections::HashMap;
use std::marker::PhantomData;

use asciiarena_transport::{Endpoint, Framing, TransportError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{Codec, ProtocolError};

/// Size of the length header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest accepted frame body (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Splits a byte stream into `In` messages and encodes `Out` messages.
pub struct LengthPrefixed<C, In, Out> {
    codec: C,
    buffers: HashMap<Endpoint, Pending>,
    _messages: PhantomData<fn() -> (In, Out)>,
}

/// Per-endpoint receive state.
#[derive(Default)]
struct Pending {
    bytes: Vec<u8>,
    /// Body bytes of an oversized frame still to be discarded.
    skip: usize,
}

/// JSON framing: the server uses `JsonFraming<ClientMessage, ServerMessage>`
/// and a client the reverse.
#[cfg(feature = "json")]
pub type JsonFraming<In, Out> = LengthPrefixed<crate::JsonCodec, In, Out>;

impl<C: Codec + Default, In, Out> Default for LengthPrefixed<C, In, Out> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Codec, In, Out> LengthPrefixed<C, In, Out> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            buffers: HashMap::new(),
            _messages: PhantomData,
        }
    }

    /// Number of endpoints with buffered state.
    pub fn tracked(&self) -> usize {
        self.buffers.len()
    }

    /// Encodes one message into a complete frame.
    pub fn encode_frame<T: Serialize>(&self, message: &T) -> Result<Vec<u8>, ProtocolError> {
        let body = self.codec.encode(message)?;
        if body.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge(body.len()));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
        // Bounded by MAX_FRAME_SIZE above, so the cast cannot truncate.
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

impl<C, In, Out> Framing for LengthPrefixed<C, In, Out>
where
    C: Codec,
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    type Inbound = In;
    type Outbound = Out;

    fn split(&mut self, mut data: &[u8], endpoint: Endpoint) -> Vec<In> {
        let pending = self.buffers.entry(endpoint).or_default();
        if pending.skip > 0 {
            let skipped = pending.skip.min(data.len());
            pending.skip -= skipped;
            data = &data[skipped..];
        }
        pending.bytes.extend_from_slice(data);

        let mut messages = Vec::new();
        while pending.bytes.len() >= HEADER_SIZE {
            let mut header = [0u8; HEADER_SIZE];
            header.copy_from_slice(&pending.bytes[..HEADER_SIZE]);
            let len = u32::from_be_bytes(header) as usize;

            if len > MAX_FRAME_SIZE {
                warn!(%endpoint, len, "frame exceeds maximum size, skipping it");
                let buffered = (pending.bytes.len() - HEADER_SIZE).min(len);
                pending.bytes.drain(..HEADER_SIZE + buffered);
                pending.skip = len - buffered;
                continue;
            }
            if pending.bytes.len() < HEADER_SIZE + len {
                break;
            }

            let frame: Vec<u8> = pending
                .bytes
                .drain(..HEADER_SIZE + len)
                .skip(HEADER_SIZE)
                .collect();
            match self.codec.decode::<In>(&frame) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(%endpoint, error = %e, "dropping undecodable frame"),
            }
        }

        messages
    }

    fn serialize(&mut self, message: &Out) -> Result<Vec<u8>, TransportError> {
        self.encode_frame(message)
            .map_err(|e| TransportError::Serialize(e.to_string()))
    }

    fn untrack(&mut self, endpoint: Endpoint) {
        match self.buffers.remove(&endpoint) {
            Some(pending) if !pending.bytes.is_empty() || pending.skip > 0 => {
                debug!(
                    %endpoint,
                    pending = pending.bytes.len(),
                    skip = pending.skip,
                    "discarding partial frame"
                );
            }
            _ => {}
        }
    }
}
