//! World simulation for ASCII Arena.
//!
//! Everything that happens *inside* an arena lives here:
//!
//! - [`Ground`]: seeded terrain generation and player origins.
//! - [`Arena`]: entities, spells and the per-step update.
//! - [`Control`] / [`MovementGate`]: per-entity movement and cast state.
//! - [`IdAllocator`]: per-arena entity ids.
//!
//! The world does no I/O and reads no clock; callers pass `now` into every
//! time-dependent operation, which keeps the simulation reproducible in
//! tests.

mod arena;
mod control;
mod entity;
mod error;
mod ground;
mod ids;

pub use arena::Arena;
pub use control::{Control, MovementGate};
pub use entity::{Entity, INITIAL_DIRECTION, PLAYER_SPEED, Spell, spell_speed};
pub use error::WorldError;
pub use ground::{Ground, MIN_ARENA_SIZE, SEED_LENGTH, WALL_DENSITY, random_seed, seed_hash};
pub use ids::IdAllocator;
