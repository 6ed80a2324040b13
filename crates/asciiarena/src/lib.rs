//! # ASCII Arena
//!
//! A multiplayer terminal arena game server. Players log in with a single
//! letter, get dropped into a walled arena and throw fireballs at each
//! other until one of them has won enough rounds.
//!
//! The crate ties the layers together:
//!
//! - [`Server`] runs the TCP reactor and the [`GameLoop`] thread.
//! - [`ClientConnection`] is the matching client side.
//! - [`ServerConfig`] holds every tunable, [`ArenaError`] every failure.
//!
//! ```rust,no_run
//! use asciiarena::prelude::*;
//!
//! let server = Server::start(ServerConfig::default())?;
//! server.wait();
//! # Ok::<(), ArenaError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use client::{ClientConnection, ClientFraming};
pub use config::{DEFAULT_PORT, ServerArgs, ServerConfig};
pub use error::ArenaError;
pub use handler::GameLoop;
pub use server::{Server, ServerFraming};
pub use signal::{ServerInput, ServerQueue, Signal};
pub use state::LoopState;

/// Re-exports for the common case.
pub mod prelude {
    pub use crate::{ArenaError, ClientConnection, LoopState, Server, ServerConfig};
    pub use asciiarena_protocol::{
        ClientMessage, Direction, LoginStatus, ServerMessage, SkillId, VERSION, Vec2,
    };
}
