//! The two message families exchanged between clients and the server.
//!
//! Both enums are internally tagged, so every JSON document carries its own
//! kind:
//!
//! ```json
//! {"type":"Login","character":"A"}
//! {"type":"LoginStatus","status":"Logged"}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{FrameEntity, FrameSpell, Grid, LoginStatus, SkillId, Vec2};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Announces the client version. Answered with `CheckedVersion` and
    /// `GameInfo`.
    Version { value: String },

    /// Claims a character in the room.
    Login { character: String },

    /// Requests a step in the direction of a unit vector.
    PlayerMovement { direction: Vec2 },

    /// Requests a cast of the skill in the given slot.
    PlayerCast { skill: SkillId },

    /// Any message kind this server does not understand.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Version { .. } => "Version",
            ClientMessage::Login { .. } => "Login",
            ClientMessage::PlayerMovement { .. } => "PlayerMovement",
            ClientMessage::PlayerCast { .. } => "PlayerCast",
            ClientMessage::Unknown => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The server version and whether the client's version is compatible.
    CheckedVersion { value: String, validation: bool },

    /// Static information about the room.
    GameInfo {
        characters: Vec<char>,
        players: usize,
        points: u32,
        arena_size: usize,
        seed: Option<String>,
    },

    /// Outcome of a `Login`.
    LoginStatus { status: LoginStatus },

    /// Characters currently registered in the room, in login order.
    PlayersInfo { characters: Vec<char> },

    /// A new arena was loaded.
    ArenaInfo { seed: String, grid: Grid },

    /// One simulation step.
    Frame {
        step: u64,
        entities: Vec<FrameEntity>,
        spells: Vec<FrameSpell>,
    },
}

impl ServerMessage {
    /// Short name used in log fields and client filters.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::CheckedVersion { .. } => "CheckedVersion",
            ServerMessage::GameInfo { .. } => "GameInfo",
            ServerMessage::LoginStatus { .. } => "LoginStatus",
            ServerMessage::PlayersInfo { .. } => "PlayersInfo",
            ServerMessage::ArenaInfo { .. } => "ArenaInfo",
            ServerMessage::Frame { .. } => "Frame",
        }
    }
}
