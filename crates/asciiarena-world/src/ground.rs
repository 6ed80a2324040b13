//! Terrain generation.
//!
//! A ground is a square [`Grid`] with a wall border and a sprinkling of
//! interior walls. Generation is a pure function of `(size, seed)`: the seed
//! string is hashed into a `StdRng`, so two servers given the same seed
//! build the same arena and clients can show the seed to reproduce it.

use asciiarena_protocol::{Grid, Terrain, Vec2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::WorldError;

/// Smallest arena with a walkable interior.
pub const MIN_ARENA_SIZE: usize = 4;

/// Length of generated seeds.
pub const SEED_LENGTH: usize = 6;

/// Probability that an interior cell becomes a wall.
pub const WALL_DENSITY: f64 = 0.1;

const SEED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Mixed into the seed hash so origin placement draws from a different
// stream than wall placement.
const ORIGIN_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Generates a random seed of [`SEED_LENGTH`] characters from `A-Z0-9`.
pub fn random_seed<R: Rng>(rng: &mut R) -> String {
    (0..SEED_LENGTH)
        .map(|_| SEED_ALPHABET[rng.random_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Stable 64-bit hash of a seed string (FNV-1a).
pub fn seed_hash(seed: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    seed.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// The terrain of one arena plus the seed it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ground {
    seed: String,
    grid: Grid,
}

impl Ground {
    /// Wraps an existing grid, for hand-made layouts.
    pub fn new(seed: impl Into<String>, grid: Grid) -> Self {
        Self {
            seed: seed.into(),
            grid,
        }
    }

    /// Builds the terrain for `size` and `seed`.
    ///
    /// # Errors
    /// Returns `WorldError::ArenaTooSmall` if `size < MIN_ARENA_SIZE`.
    pub fn generate(size: usize, seed: &str) -> Result<Self, WorldError> {
        if size < MIN_ARENA_SIZE {
            return Err(WorldError::ArenaTooSmall {
                size,
                min: MIN_ARENA_SIZE,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed_hash(seed));
        let mut grid = Grid::new(size);
        let last = size as i32 - 1;

        for position in grid.positions().collect::<Vec<_>>() {
            let border = position.x == 0 || position.y == 0 || position.x == last || position.y == last;
            if border || rng.random_bool(WALL_DENSITY) {
                grid.set(position, Terrain::Wall);
            }
        }

        Ok(Self {
            seed: seed.to_string(),
            grid,
        })
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Returns `true` if `position` is out of bounds or a wall.
    pub fn is_blocked(&self, position: Vec2) -> bool {
        self.grid.is_blocked(position)
    }

    /// Every walkable position, row by row.
    pub fn free_positions(&self) -> Vec<Vec2> {
        self.grid
            .positions()
            .filter(|p| !self.grid.is_blocked(*p))
            .collect()
    }

    /// Picks `count` distinct walkable positions.
    ///
    /// Deterministic for a given seed, like the terrain itself.
    ///
    /// # Errors
    /// Returns `WorldError::NotEnoughSpace` if there are fewer free cells
    /// than `count`.
    pub fn player_origins(&self, count: usize) -> Result<Vec<Vec2>, WorldError> {
        let mut free = self.free_positions();
        if free.len() < count {
            return Err(WorldError::NotEnoughSpace {
                players: count,
                free: free.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(seed_hash(&self.seed) ^ ORIGIN_STREAM);
        free.shuffle(&mut rng);
        free.truncate(count);
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_seed_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let seed = random_seed(&mut rng);
        assert_eq!(seed.len(), SEED_LENGTH);
        assert!(seed.bytes().all(|b| SEED_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_seed_hash_is_stable_and_distinguishes_seeds() {
        assert_eq!(seed_hash("ABC123"), seed_hash("ABC123"));
        assert_ne!(seed_hash("ABC123"), seed_hash("ABC124"));
    }

    #[test]
    fn test_generation_is_deterministic_per_seed() {
        let a = Ground::generate(16, "SEED01").unwrap();
        let b = Ground::generate(16, "SEED01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.player_origins(4).unwrap(), b.player_origins(4).unwrap());
    }

    #[test]
    fn test_border_is_walled() {
        let ground = Ground::generate(8, "BORDER").unwrap();
        for i in 0..8 {
            assert!(ground.is_blocked(Vec2::new(i, 0)));
            assert!(ground.is_blocked(Vec2::new(i, 7)));
            assert!(ground.is_blocked(Vec2::new(0, i)));
            assert!(ground.is_blocked(Vec2::new(7, i)));
        }
        assert!(ground.is_blocked(Vec2::new(-1, 3)));
    }

    #[test]
    fn test_too_small_arena_is_rejected() {
        assert!(matches!(
            Ground::generate(3, "X"),
            Err(WorldError::ArenaTooSmall { size: 3, .. })
        ));
    }

    #[test]
    fn test_origins_are_distinct_and_free() {
        let ground = Ground::generate(12, "ORIGIN").unwrap();
        let origins = ground.player_origins(5).unwrap();
        assert_eq!(origins.len(), 5);
        for (i, origin) in origins.iter().enumerate() {
            assert!(!ground.is_blocked(*origin));
            assert!(!origins[i + 1..].contains(origin));
        }
    }

    #[test]
    fn test_origins_fail_without_space() {
        let ground = Ground::generate(4, "TINY").unwrap();
        let free = ground.free_positions().len();
        assert!(free <= 4);
        assert!(matches!(
            ground.player_origins(free + 1),
            Err(WorldError::NotEnoughSpace { .. })
        ));
    }
}
