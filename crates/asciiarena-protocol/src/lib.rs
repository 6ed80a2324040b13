//! Wire protocol for ASCII Arena.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]) and the value types
//!   they carry ([`Vec2`], [`Direction`], [`Grid`], ...).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how one message becomes the
//!   bytes of one frame body.
//! - **Framing** ([`LengthPrefixed`], [`JsonFraming`]): how frame bodies are
//!   delimited on a TCP stream. Implements the transport's `Framing` trait,
//!   so it plugs straight into a `Reactor`.
//! - **Version** ([`VERSION`], [`is_compatible`]).
//!
//! ```text
//! Transport (bytes) → Protocol (messages) → Game loop
//! ```

mod codec;
mod error;
mod framing;
mod message;
mod types;
mod version;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
#[cfg(feature = "json")]
pub use framing::JsonFraming;
pub use framing::{HEADER_SIZE, LengthPrefixed, MAX_FRAME_SIZE};
pub use message::{ClientMessage, ServerMessage};
pub use types::{
    Direction, EntityId, FrameEntity, FrameSpell, Grid, LoginStatus, SkillId, SpellKind, Terrain,
    Vec2,
};
pub use version::{VERSION, is_compatible};
