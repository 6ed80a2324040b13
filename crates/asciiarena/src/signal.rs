//! Everything the game loop consumes: client messages and internal signals.
//!
//! Signals travel through the same inbound queue as network traffic, with
//! no endpoint attached, so the loop sees a single ordered stream.

use std::fmt;

use asciiarena_protocol::{ClientMessage, ServerMessage};
use asciiarena_transport::PackageQueue;
use asciiarena_world::{Arena, WorldError};

/// Internal events of the game loop.
#[derive(Debug)]
pub enum Signal {
    /// The room is ready for a new round: generate an arena.
    NewArena,
    /// Arena generation finished on the worker thread.
    ///
    /// `generation` is the loop's generation counter when the work was
    /// started. A result for an older generation is discarded.
    ArenaCreated {
        generation: u64,
        arena: Result<Box<Arena>, WorldError>,
    },
    /// Time to advance the arena one step.
    ComputeFrame,
    /// The series is over: drop the roster and wait for new players.
    ResetRoom,
    /// Stop the game loop.
    Shutdown,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewArena => "NewArena",
            Self::ArenaCreated { .. } => "ArenaCreated",
            Self::ComputeFrame => "ComputeFrame",
            Self::ResetRoom => "ResetRoom",
            Self::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One item of the game loop's inbound stream.
#[derive(Debug)]
pub enum ServerInput {
    Message(ClientMessage),
    Signal(Signal),
}

impl From<ClientMessage> for ServerInput {
    fn from(message: ClientMessage) -> Self {
        Self::Message(message)
    }
}

impl From<Signal> for ServerInput {
    fn from(signal: Signal) -> Self {
        Self::Signal(signal)
    }
}

/// The queue shared by the server reactor, the game loop and its timers.
pub type ServerQueue = PackageQueue<ServerInput, ServerMessage>;
