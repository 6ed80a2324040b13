//! Controls: the per-entity state that decides what happens each step.
//!
//! Every movable thing in an arena carries exactly one [`Control`]. The
//! variants share a [`MovementGate`] that rate-limits steps to the mobile's
//! speed; a player control additionally queues at most one cast request
//! until the next step consumes it.

use std::time::{Duration, Instant};

use asciiarena_protocol::SkillId;

/// Rate limiter for grid steps.
///
/// A mobile with speed `s` (cells per second) may step once every `1 / s`
/// seconds. The gate remembers when the last step was accepted; a fresh or
/// reset gate lets the next step through immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementGate {
    last_step: Option<Instant>,
}

impl MovementGate {
    /// A gate that already counts `now` as its last step.
    pub fn started_at(now: Instant) -> Self {
        Self {
            last_step: Some(now),
        }
    }

    /// Time between two steps at `speed` cells per second.
    pub fn period(speed: f64) -> Duration {
        if speed > 0.0 {
            Duration::from_secs_f64(1.0 / speed)
        } else {
            Duration::MAX
        }
    }

    /// Returns `true` if a step at `speed` is allowed at `now`.
    pub fn is_open(&self, now: Instant, speed: f64) -> bool {
        match self.last_step {
            None => speed > 0.0,
            Some(last) => now.saturating_duration_since(last) >= Self::period(speed),
        }
    }

    /// Records an accepted step.
    pub fn record(&mut self, now: Instant) {
        self.last_step = Some(now);
    }

    /// Forgets the last step, so the next one is allowed immediately.
    pub fn reset(&mut self) {
        self.last_step = None;
    }

    pub fn last_step(&self) -> Option<Instant> {
        self.last_step
    }
}

/// What drives an arena element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// A non-player entity. Moves only along its latched direction.
    Entity(MovementGate),
    /// A travelling spell. Always moves.
    Spell(MovementGate),
    /// A player's entity. Driven by `PlayerMovement` and `PlayerCast`.
    Player {
        gate: MovementGate,
        pending_cast: Option<SkillId>,
    },
}

impl Control {
    pub fn player() -> Self {
        Control::Player {
            gate: MovementGate::default(),
            pending_cast: None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Control::Player { .. })
    }

    pub fn gate(&self) -> &MovementGate {
        match self {
            Control::Entity(gate) | Control::Spell(gate) | Control::Player { gate, .. } => gate,
        }
    }

    pub fn gate_mut(&mut self) -> &mut MovementGate {
        match self {
            Control::Entity(gate) | Control::Spell(gate) | Control::Player { gate, .. } => gate,
        }
    }

    /// Queues a cast for the next step, replacing any cast not yet
    /// resolved. Returns `false` for controls that cannot cast.
    pub fn request_cast(&mut self, skill: SkillId) -> bool {
        match self {
            Control::Player { pending_cast, .. } => {
                *pending_cast = Some(skill);
                true
            }
            _ => false,
        }
    }

    /// Removes and returns the queued cast.
    pub fn take_cast(&mut self) -> Option<SkillId> {
        match self {
            Control::Player { pending_cast, .. } => pending_cast.take(),
            _ => None,
        }
    }

    pub fn pending_cast(&self) -> Option<SkillId> {
        match self {
            Control::Player { pending_cast, .. } => *pending_cast,
            _ => None,
        }
    }
}
