//! Unified error type for ASCII Arena.

use std::time::Duration;

use asciiarena_protocol::ProtocolError;
use asciiarena_room::RoomError;
use asciiarena_tick::TickError;
use asciiarena_transport::TransportError;
use asciiarena_world::WorldError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapping variant lets `?` convert
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// A transport-level error (bind, connect, selector).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, framing).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (config, unknown character).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A world-level error (generation, placement).
    #[error(transparent)]
    World(#[from] WorldError),

    /// A timer error.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// The server configuration is unusable.
    #[error("invalid config: {0}")]
    Config(String),

    /// A server thread could not be started.
    #[error("thread spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    /// The peer closed the connection.
    #[error("disconnected")]
    Disconnected,

    /// No matching message arrived in time.
    #[error("no message within {0:?}")]
    Timeout(Duration),

    /// The server speaks an incompatible version.
    #[error("incompatible server version {0}")]
    IncompatibleVersion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ArenaError = TransportError::AddressInUse(3001).into();
        assert!(matches!(err, ArenaError::Transport(_)));
        assert!(err.to_string().contains("3001"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ArenaError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, ArenaError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: ArenaError = RoomError::UnknownCharacter('Q').into();
        assert!(matches!(err, ArenaError::Room(_)));
    }

    #[test]
    fn test_from_world_error() {
        let err: ArenaError = WorldError::ArenaTooSmall { size: 2, min: 4 }.into();
        assert!(matches!(err, ArenaError::World(_)));
        assert!(err.to_string().contains("minimum"));
    }

    #[test]
    fn test_from_tick_error() {
        let err: ArenaError = TickError::ShutDown.into();
        assert!(matches!(err, ArenaError::Tick(_)));
    }
}
