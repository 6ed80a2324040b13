//! Error types for the room layer.

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The configuration cannot describe a playable room.
    #[error("invalid room config: {0}")]
    InvalidConfig(String),

    /// A login character is not a single uppercase ASCII letter.
    #[error("invalid character {0:?}")]
    InvalidCharacter(String),

    /// No roster entry uses this character.
    #[error("no player with character '{0}'")]
    UnknownCharacter(char),
}
