//! Arena elements: entities (players, NPCs) and spells.

use asciiarena_protocol::{Direction, EntityId, FrameEntity, FrameSpell, SpellKind, Vec2};

use crate::control::{Control, MovementGate};

/// Cells per second a player walks.
pub const PLAYER_SPEED: f64 = 8.0;

/// Direction a freshly placed entity faces.
pub const INITIAL_DIRECTION: Direction = Direction::Down;

/// A character standing in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    character: char,
    position: Vec2,
    direction: Direction,
    moving: bool,
    speed: f64,
    pub(crate) control: Control,
}

impl Entity {
    /// A player-controlled entity.
    pub fn player(id: EntityId, character: char, position: Vec2) -> Self {
        Self {
            id,
            character,
            position,
            direction: INITIAL_DIRECTION,
            moving: false,
            speed: PLAYER_SPEED,
            control: Control::player(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn character(&self) -> char {
        self.character
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn is_player(&self) -> bool {
        self.control.is_player()
    }

    /// Latches `direction` and starts moving. Turning resets the movement
    /// gate so the first step in a new direction is not delayed.
    pub fn request_move(&mut self, direction: Direction) {
        self.moving = true;
        if direction != self.direction {
            self.direction = direction;
            self.control.gate_mut().reset();
        }
    }

    /// The cell one step ahead in the facing direction.
    pub fn ahead(&self) -> Vec2 {
        self.position + self.direction.as_vector()
    }

    pub(crate) fn place(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn stop(&mut self) {
        self.moving = false;
    }

    pub fn to_frame(&self) -> FrameEntity {
        FrameEntity {
            id: self.id,
            character: self.character,
            position: self.position,
            direction: self.direction,
        }
    }
}

/// A spell travelling across the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Spell {
    id: EntityId,
    kind: SpellKind,
    caster: EntityId,
    position: Vec2,
    direction: Direction,
    pub(crate) control: Control,
}

impl Spell {
    pub(crate) fn new(
        id: EntityId,
        kind: SpellKind,
        caster: EntityId,
        position: Vec2,
        direction: Direction,
        gate: MovementGate,
    ) -> Self {
        Self {
            id,
            kind,
            caster,
            position,
            direction,
            control: Control::Spell(gate),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> SpellKind {
        self.kind
    }

    /// The entity that cast this spell.
    pub fn caster(&self) -> EntityId {
        self.caster
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f64 {
        spell_speed(self.kind)
    }

    pub(crate) fn advance(&mut self) {
        self.position += self.direction.as_vector();
    }

    pub fn to_frame(&self) -> FrameSpell {
        FrameSpell {
            id: self.id,
            kind: self.kind,
            position: self.position,
            direction: self.direction,
        }
    }
}

/// Cells per second a spell of `kind` travels.
pub fn spell_speed(kind: SpellKind) -> f64 {
    match kind {
        SpellKind::FireBall => 16.0,
    }
}
