//! Room configuration.

use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Characters available for login: one seat per uppercase letter.
pub const MAX_PLAYERS: usize = 26;

/// Configuration for the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Players required before an arena is generated. Also the room size.
    pub players: usize,

    /// Points a player needs to win the round series.
    pub points_to_win: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            players: 2,
            points_to_win: 3,
        }
    }
}

impl RoomConfig {
    /// Checks that the configuration describes a playable room.
    ///
    /// # Errors
    /// Returns `RoomError::InvalidConfig` if `players` is zero or larger than
    /// the number of available characters, or if `points_to_win` is zero.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.players == 0 || self.players > MAX_PLAYERS {
            return Err(RoomError::InvalidConfig(format!(
                "players must be between 1 and {MAX_PLAYERS}, got {}",
                self.players
            )));
        }
        if self.points_to_win == 0 {
            return Err(RoomError::InvalidConfig(
                "points to win must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
