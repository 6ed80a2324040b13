//! The arena: one round's worth of world state.
//!
//! An arena is built off the logic thread (generation can be slow on big
//! maps), handed over whole, and from then on mutated only by
//! [`Arena::update`] and the player requests the game loop forwards.
//!
//! # One step
//!
//! ```text
//! for each entity, in placement order:
//!     step forward if moving, the gate is open and the cell ahead is free
//!     resolve the queued cast, if any
//!     stop moving
//! for each spell, in cast order:
//!     advance if its gate is open; vanish against terrain
//!     hit whatever entity shares its cell
//! ```
//!
//! Entities see each other's *updated* positions: an entity that moved
//! earlier in the step already occupies its new cell.

use std::time::Instant;

use asciiarena_protocol::{Direction, EntityId, FrameEntity, FrameSpell, SkillId, SpellKind, Vec2};
use tracing::{debug, info, trace};

use crate::control::MovementGate;
use crate::entity::{Entity, Spell};
use crate::ground::Ground;
use crate::ids::IdAllocator;
use crate::WorldError;

/// The world state of one round.
#[derive(Debug)]
pub struct Arena {
    step: u64,
    ground: Ground,
    entities: Vec<Entity>,
    spells: Vec<Spell>,
    ids: IdAllocator,
    initial_players: usize,
}

impl Arena {
    /// An arena on generated terrain, with nobody in it.
    ///
    /// # Errors
    /// Returns `WorldError::ArenaTooSmall` for sizes without an interior.
    pub fn new(size: usize, seed: &str) -> Result<Self, WorldError> {
        Ok(Self::with_ground(Ground::generate(size, seed)?))
    }

    /// An arena on the given terrain, with nobody in it.
    pub fn with_ground(ground: Ground) -> Self {
        Self {
            step: 0,
            ground,
            entities: Vec::new(),
            spells: Vec::new(),
            ids: IdAllocator::new(),
            initial_players: 0,
        }
    }

    /// Generates terrain and places one player entity per character, in
    /// the given order.
    ///
    /// # Errors
    /// Fails if the terrain cannot be generated or has fewer free cells
    /// than players.
    pub fn generate(size: usize, seed: &str, characters: &[char]) -> Result<Self, WorldError> {
        let mut arena = Self::new(size, seed)?;
        let origins = arena.ground.player_origins(characters.len())?;
        for (character, origin) in characters.iter().zip(origins) {
            arena.create_player(*character, origin)?;
        }
        Ok(arena)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The step the next [`update`](Self::update) will compute.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn seed(&self) -> &str {
        self.ground.seed()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn entity_at(&self, position: Vec2) -> Option<&Entity> {
        self.entities.iter().find(|e| e.position() == position)
    }

    /// Returns `true` if an entity could stand on `position`.
    pub fn is_free(&self, position: Vec2) -> bool {
        !self.ground.is_blocked(position) && self.entity_at(position).is_none()
    }

    /// Player entities still standing.
    pub fn alive_players(&self) -> usize {
        self.entities.iter().filter(|e| e.is_player()).count()
    }

    /// Returns `true` once the round is decided: nobody is left, or a
    /// multi-player round is down to its last player.
    pub fn has_finished(&self) -> bool {
        let alive = self.alive_players();
        alive == 0 || (self.initial_players > 1 && alive <= 1)
    }

    /// The character of the last player standing in a finished round.
    pub fn survivor(&self) -> Option<char> {
        if !self.has_finished() {
            return None;
        }
        let mut players = self.entities.iter().filter(|e| e.is_player());
        match (players.next(), players.next()) {
            (Some(last), None) => Some(last.character()),
            _ => None,
        }
    }

    pub fn frame_entities(&self) -> Vec<FrameEntity> {
        self.entities.iter().map(Entity::to_frame).collect()
    }

    pub fn frame_spells(&self) -> Vec<FrameSpell> {
        self.spells.iter().map(Spell::to_frame).collect()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Places a new player entity.
    ///
    /// # Errors
    /// Returns `WorldError::PositionTaken` if `position` is blocked or
    /// occupied.
    pub fn create_player(&mut self, character: char, position: Vec2) -> Result<EntityId, WorldError> {
        if !self.is_free(position) {
            return Err(WorldError::PositionTaken(position));
        }
        let id = self.ids.allocate();
        self.entities.push(Entity::player(id, character, position));
        self.initial_players += 1;
        debug!(%id, %character, %position, "player placed");
        Ok(id)
    }

    /// Latches a movement request for entity `id`.
    ///
    /// # Errors
    /// Returns `WorldError::UnknownEntity` if the entity is gone.
    pub fn move_entity(&mut self, id: EntityId, direction: Direction) -> Result<(), WorldError> {
        self.entity_mut(id)?.request_move(direction);
        Ok(())
    }

    /// Queues a cast for entity `id`. Returns `false` if the entity cannot
    /// cast.
    ///
    /// # Errors
    /// Returns `WorldError::UnknownEntity` if the entity is gone.
    pub fn cast(&mut self, id: EntityId, skill: SkillId) -> Result<bool, WorldError> {
        Ok(self.entity_mut(id)?.control.request_cast(skill))
    }

    /// Removes an entity and frees its id.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        Some(self.remove_entity_at(index))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, WorldError> {
        self.entities
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or(WorldError::UnknownEntity(id))
    }

    fn remove_entity_at(&mut self, index: usize) -> Entity {
        let entity = self.entities.remove(index);
        self.ids.release(entity.id());
        entity
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Computes one step at time `now` and returns its number.
    pub fn update(&mut self, now: Instant) -> u64 {
        let step = self.step;

        let mut index = 0;
        while index < self.entities.len() {
            let removed = self.update_entity(index, now, step);
            if removed.is_some_and(|r| r < index) {
                index -= 1;
            }
            index += 1;
        }

        self.update_spells(now, step);

        self.step += 1;
        step
    }

    /// Updates the entity at `index`. Returns the index of an entity the
    /// update removed, if any.
    fn update_entity(&mut self, index: usize, now: Instant, step: u64) -> Option<usize> {
        let entity = &self.entities[index];
        if entity.is_moving() && entity.control.gate().is_open(now, entity.speed()) {
            let from = entity.position();
            let target = entity.ahead();
            if self.is_free(target) {
                let entity = &mut self.entities[index];
                entity.place(target);
                entity.control.gate_mut().record(now);
                trace!(step, id = %entity.id(), %from, to = %target, "entity moved");
            }
        }

        let removed = match self.entities[index].control.take_cast() {
            Some(skill) => self.resolve_cast(index, skill, now, step),
            None => None,
        };

        let index = match removed {
            Some(r) if r < index => index - 1,
            _ => index,
        };
        self.entities[index].stop();
        removed
    }

    /// Spawns the spell for `skill` one cell ahead of the caster. A spell
    /// born inside terrain fizzles; one born on an entity hits it at once.
    fn resolve_cast(&mut self, caster: usize, skill: SkillId, now: Instant, step: u64) -> Option<usize> {
        let caster = &self.entities[caster];
        let (caster_id, position, direction) = (caster.id(), caster.ahead(), caster.direction());

        let Some(kind) = SpellKind::from_skill(skill) else {
            debug!(step, caster = %caster_id, skill = skill.0, "unknown skill, cast ignored");
            return None;
        };

        if self.ground.is_blocked(position) {
            debug!(step, caster = %caster_id, ?kind, "spell fizzled against terrain");
            return None;
        }

        if let Some(target) = self.entities.iter().position(|e| e.position() == position) {
            let hit = self.remove_entity_at(target);
            info!(step, caster = %caster_id, target = %hit.id(), character = %hit.character(), "entity hit");
            return Some(target);
        }

        let id = self.ids.allocate();
        self.spells.push(Spell::new(
            id,
            kind,
            caster_id,
            position,
            direction,
            MovementGate::started_at(now),
        ));
        debug!(step, caster = %caster_id, spell = %id, ?kind, "spell cast");
        None
    }

    fn update_spells(&mut self, now: Instant, step: u64) {
        let mut index = 0;
        while index < self.spells.len() {
            let spell = &mut self.spells[index];
            let mut vanished = false;

            if spell.control.gate().is_open(now, spell.speed()) {
                let target = spell.position() + spell.direction().as_vector();
                if self.ground.is_blocked(target) {
                    vanished = true;
                } else {
                    spell.advance();
                    spell.control.gate_mut().record(now);
                }
            }

            if !vanished {
                let position = self.spells[index].position();
                if let Some(target) = self.entities.iter().position(|e| e.position() == position) {
                    let hit = self.remove_entity_at(target);
                    info!(
                        step,
                        spell = %self.spells[index].id(),
                        target = %hit.id(),
                        character = %hit.character(),
                        "entity hit"
                    );
                    vanished = true;
                }
            }

            if vanished {
                let spell = self.spells.remove(index);
                self.ids.release(spell.id());
                trace!(step, spell = %spell.id(), "spell vanished");
            } else {
                index += 1;
            }
        }
    }
}
