//! Error types for the world layer.

use asciiarena_protocol::{EntityId, Vec2};

/// Errors that can occur while building or driving an arena.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The arena is too small to have any walkable interior.
    #[error("arena size {size} is below the minimum of {min}")]
    ArenaTooSmall { size: usize, min: usize },

    /// There are fewer free cells than players to place.
    #[error("cannot place {players} players on {free} free cells")]
    NotEnoughSpace { players: usize, free: usize },

    /// A position is blocked terrain or already occupied.
    #[error("position {0} is not free")]
    PositionTaken(Vec2),

    /// No entity with this id exists in the arena.
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),
}
