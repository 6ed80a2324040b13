//! Server configuration and command-line arguments.

use std::time::Duration;

use asciiarena_room::RoomConfig;
use asciiarena_tick::PacerConfig;
use asciiarena_world::MIN_ARENA_SIZE;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::ArenaError;

pub const DEFAULT_PORT: u16 = 3001;

/// Everything the server needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port to listen on. `0` picks a free port.
    pub port: u16,
    /// Players per round. The first arena loads when this many are logged.
    pub players: usize,
    /// Points needed to win the series.
    pub points: u32,
    /// Side length of the square arena.
    pub arena_size: usize,
    /// Fixed arena seed. `None` draws a fresh seed every round.
    pub seed: Option<String>,
    /// Target frames per second.
    pub frame_rate: u32,
    /// Pause between a series win and the room reset.
    pub reset_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            players: 2,
            points: 3,
            arena_size: 8,
            seed: None,
            frame_rate: PacerConfig::DEFAULT_FRAME_RATE,
            reset_delay: Duration::from_secs(1),
        }
    }
}

impl ServerConfig {
    /// Checks the configuration before anything is bound or spawned.
    ///
    /// # Errors
    /// `ArenaError::Room` for unplayable rooms, `ArenaError::Config` for an
    /// arena too small or an empty seed.
    pub fn validate(&self) -> Result<(), ArenaError> {
        self.room_config().validate()?;
        if self.arena_size < MIN_ARENA_SIZE {
            return Err(ArenaError::Config(format!(
                "arena size must be at least {MIN_ARENA_SIZE}, got {}",
                self.arena_size
            )));
        }
        if self.seed.as_deref().is_some_and(str::is_empty) {
            return Err(ArenaError::Config("seed must not be empty".into()));
        }
        Ok(())
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            players: self.players,
            points_to_win: self.points,
        }
    }

    pub fn pacer_config(&self) -> PacerConfig {
        PacerConfig::with_rate(self.frame_rate)
    }
}

/// Command-line arguments of `asciiarena-server`.
#[derive(Parser, Debug)]
#[command(author, version, about = "ASCII Arena game server")]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Players per round
    #[arg(long, default_value_t = 2)]
    pub players: usize,

    /// Points needed to win
    #[arg(long, default_value_t = 3)]
    pub points: u32,

    /// Side length of the arena
    #[arg(short, long, default_value_t = 8)]
    pub arena_size: usize,

    /// Fixed arena seed (random every round when omitted)
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Target frames per second
    #[arg(long, default_value_t = PacerConfig::DEFAULT_FRAME_RATE)]
    pub frame_rate: u32,

    /// Milliseconds between a series win and the room reset
    #[arg(long, default_value_t = 1000)]
    pub reset_delay_ms: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub debug: bool,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            port: args.port,
            players: args.players,
            points: args.points,
            arena_size: args.arena_size,
            seed: args.seed,
            frame_rate: args.frame_rate,
            reset_delay: Duration::from_millis(args.reset_delay_ms),
        }
    }
}
