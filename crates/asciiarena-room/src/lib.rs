//! Room layer for ASCII Arena.
//!
//! The server hosts exactly one room. This crate owns its roster and the
//! rules for getting into it:
//!
//! - [`Room`]: players keyed by login character, their endpoints, entity
//!   handles and round points.
//! - [`RoomConfig`]: seats and points needed to win.
//! - [`RoomError`]: what can go wrong.
//!
//! The room does no I/O and never touches an arena; the game loop reads
//! it and decides what to send.

mod config;
mod error;
mod room;

pub use config::{MAX_PLAYERS, RoomConfig};
pub use error::RoomError;
pub use room::{Addition, Player, Room, parse_character};
