//! Shared value types that appear inside wire messages.
//!
//! These are the small building blocks both sides agree on: entity ids,
//! grid coordinates, facing directions and terrain. The world crate builds
//! its simulation on top of them, so a `Frame` can be produced without any
//! conversion layer.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of an entity or spell inside one arena.
///
/// Serialized as a plain number. Ids are only meaningful for the arena that
/// issued them; a new arena starts counting from zero again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// Index of a skill in a player's skill bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u8);

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// An integer grid coordinate or displacement.
///
/// `x` grows to the right and `y` grows upwards, so `(0, 0)` is the
/// bottom-left cell of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four orthogonal facing directions.
///
/// On the wire a direction is an enum name (`"Up"`, `"Left"`...) inside
/// frames, and a unit vector inside `PlayerMovement`. Clients send vectors
/// because that is what their input layer produces; the server validates
/// them with [`Direction::from_vector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The unit displacement for one step in this direction.
    pub fn as_vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0, 1),
            Direction::Down => Vec2::new(0, -1),
            Direction::Left => Vec2::new(-1, 0),
            Direction::Right => Vec2::new(1, 0),
        }
    }

    /// Maps a unit vector back to its direction.
    ///
    /// Returns `None` for anything that is not one of the four orthogonal
    /// unit vectors (diagonals, zero, longer jumps).
    pub fn from_vector(vector: Vec2) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_vector() == vector)
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// What occupies a ground cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Empty,
    Wall,
}

impl Terrain {
    /// Returns `true` if nothing can stand on or pass through this cell.
    pub fn is_blocking(self) -> bool {
        matches!(self, Terrain::Wall)
    }
}

/// A square terrain grid, stored row by row starting at `y = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Terrain>,
}

impl Grid {
    /// Creates a `size × size` grid of empty cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Terrain::Empty; size * size],
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if `position` lies inside the grid.
    pub fn contains(&self, position: Vec2) -> bool {
        self.index(position).is_some()
    }

    /// The terrain at `position`, or `None` when out of bounds.
    pub fn get(&self, position: Vec2) -> Option<Terrain> {
        self.index(position).map(|i| self.cells[i])
    }

    /// Overwrites the terrain at `position`. Out-of-bounds writes are
    /// ignored and return `false`.
    pub fn set(&mut self, position: Vec2, terrain: Terrain) -> bool {
        match self.index(position) {
            Some(i) => {
                self.cells[i] = terrain;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `position` is out of bounds or blocked terrain.
    pub fn is_blocked(&self, position: Vec2) -> bool {
        self.get(position).is_none_or(Terrain::is_blocking)
    }

    /// Every position in the grid, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| Vec2::new(x, y)))
    }

    fn index(&self, position: Vec2) -> Option<usize> {
        let (x, y) = (usize::try_from(position.x).ok()?, usize::try_from(position.y).ok()?);
        (x < self.size && y < self.size).then_some(y * self.size + x)
    }
}

// ---------------------------------------------------------------------------
// Game values
// ---------------------------------------------------------------------------

/// The kind of a travelling spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellKind {
    FireBall,
}

impl SpellKind {
    /// The spell cast by the skill in slot `skill`, if that slot exists.
    pub fn from_skill(skill: SkillId) -> Option<SpellKind> {
        match skill.0 {
            0 => Some(SpellKind::FireBall),
            _ => None,
        }
    }
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoginStatus {
    /// A new roster entry was created.
    Logged,
    /// A detached entry with the same character was re-attached.
    Reconnected,
    /// Every seat in the room is taken.
    RoomCompleted,
    /// Another connected player already uses this character.
    AlreadyExists,
    /// The character is not a single uppercase ASCII letter.
    InvalidCharacter,
}

impl LoginStatus {
    /// Returns `true` if the sender now owns a roster entry.
    pub fn is_logged(self) -> bool {
        matches!(self, LoginStatus::Logged | LoginStatus::Reconnected)
    }
}

/// An entity as shown in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEntity {
    pub id: EntityId,
    pub character: char,
    pub position: Vec2,
    pub direction: Direction,
}

/// A spell as shown in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpell {
    pub id: EntityId,
    pub kind: SpellKind,
    pub position: Vec2,
    pub direction: Direction,
}
