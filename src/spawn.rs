//! Per-element random seeding.
//!
//! Every particle gets its own RNG derived from `(seed, index)`, so spawning
//! can run in parallel in any order and still produce the same positions for
//! the same seed.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Lower corner of the particle spawn box.
pub const SPAWN_MIN: Vec3 = Vec3::new(-50.0, -10.0, -50.0);

/// Upper corner of the particle spawn box.
pub const SPAWN_MAX: Vec3 = Vec3::new(50.0, 10.0, 50.0);

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0x5eed_f1e1d;

/// Random source for one element.
pub struct SpawnContext {
    /// Index of the element being spawned.
    pub index: usize,
    rng: SmallRng,
}

impl SpawnContext {
    /// RNG for element `index` under `seed`.
    ///
    /// The index is spread with a golden-ratio multiply before mixing so
    /// neighbouring indices start from unrelated states.
    pub fn new(index: usize, seed: u64) -> Self {
        let mixed = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            index,
            rng: SmallRng::seed_from_u64(mixed),
        }
    }

    /// Random f32 in `[min, max)`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Uniform point inside the axis-aligned box `[min, max)`.
    pub fn random_in_box(&mut self, min: Vec3, max: Vec3) -> Vec3 {
        Vec3::new(
            self.random_range(min.x, max.x),
            self.random_range(min.y, max.y),
            self.random_range(min.z, max.z),
        )
    }

    /// Uniform point inside the particle spawn box.
    pub fn random_spawn_position(&mut self) -> Vec3 {
        self.random_in_box(SPAWN_MIN, SPAWN_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_index_same_position() {
        let a = SpawnContext::new(42, DEFAULT_SEED).random_spawn_position();
        let b = SpawnContext::new(42, DEFAULT_SEED).random_spawn_position();
        assert_eq!(a, b);
    }

    #[test]
    fn test_neighbours_differ() {
        let a = SpawnContext::new(0, DEFAULT_SEED).random_spawn_position();
        let b = SpawnContext::new(1, DEFAULT_SEED).random_spawn_position();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seed_changes_positions() {
        let a = SpawnContext::new(5, 1).random_spawn_position();
        let b = SpawnContext::new(5, 2).random_spawn_position();
        assert_ne!(a, b);
    }

    #[test]
    fn test_spawn_inside_box() {
        for i in 0..4096 {
            let p = SpawnContext::new(i, DEFAULT_SEED).random_spawn_position();
            assert!(p.cmpge(SPAWN_MIN).all() && p.cmple(SPAWN_MAX).all(), "{:?}", p);
        }
    }

    #[test]
    fn test_spawn_covers_box() {
        let points: Vec<Vec3> = (0..4096)
            .map(|i| SpawnContext::new(i, DEFAULT_SEED).random_spawn_position())
            .collect();
        let min = points.iter().fold(Vec3::MAX, |m, p| m.min(*p));
        let max = points.iter().fold(Vec3::MIN, |m, p| m.max(*p));
        assert!(min.x < -45.0 && max.x > 45.0);
        assert!(min.y < -9.0 && max.y > 9.0);
    }
}
