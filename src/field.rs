//! Directional noise field.
//!
//! Turns the scalar [`simplex3`] noise into a unit direction at every point of
//! space. Both the particle swarm and the voxel grid sample this field.
//!
//! # How a direction is formed
//!
//! A single noise sample `n` at `pos * scale - time * speed` feeds two angle
//! proxies:
//!
//! - `theta = n * -2 + 1` is used directly as the vertical component
//! - `phi = n * TWO_PI` is a horizontal angle in radians
//!
//! and the result is `normalize((cos(phi), theta, sin(phi)))`. Both proxies
//! read the same point, so they are correlated; this keeps the field cheap.
//!
//! # Example
//!
//! ```ignore
//! use swarmfield::field::{direction, NoiseParams};
//!
//! let params = NoiseParams::new(Vec3::splat(0.005), Vec3::splat(0.1));
//! let dir = params.direction(Vec3::new(10.0, 0.0, 3.0), time);
//! assert!((dir.length() - 1.0).abs() < 1e-5);
//! ```

use crate::noise::simplex3;
use glam::Vec3;

/// One full turn in radians.
pub const TWO_PI: f32 = std::f32::consts::TAU;

/// Spatial scale the particle swarm samples the field at.
pub const PARTICLE_NOISE_SCALE: f32 = 0.01;

/// Stretch applied to the x component of particle directions.
pub const PARTICLE_X_STRETCH: f32 = 4.0;

/// Normalize `v`, or return `+Y` when `v` has no usable length.
///
/// The direction formulas always produce a vector of length >= 1 for finite
/// input, so this only falls back for NaN or infinite positions.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::Y)
}

#[inline]
fn angles(sample: f32) -> (f32, f32) {
    let theta = sample * -2.0 + 1.0;
    let phi = sample * TWO_PI;
    (theta, phi)
}

/// Unit direction of the field at `pos`, animated by `time`.
pub fn direction(pos: Vec3, scale: Vec3, speed: Vec3, time: f32) -> Vec3 {
    let p = pos * scale - speed * time;
    let (theta, _) = angles(simplex3(p));
    let (_, phi) = angles(simplex3(p));
    safe_normalize(Vec3::new(phi.cos(), theta, phi.sin()))
}

/// How particles read the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParticleNoise {
    /// The field is frozen; particles move through it.
    #[default]
    Static,
    /// The field drifts over time: the vertical proxy scrolls at `0.1` per
    /// second and the horizontal one at `0.5`, sampled independently.
    Drifting,
}

/// Particle variant of [`direction`]: fixed `0.01` scale and the x component
/// stretched by 4 before normalizing.
pub fn particle_direction(pos: Vec3, time: f32, mode: ParticleNoise) -> Vec3 {
    let p = pos * PARTICLE_NOISE_SCALE;
    let (theta, phi) = match mode {
        ParticleNoise::Static => {
            let n = simplex3(p);
            angles(n)
        }
        ParticleNoise::Drifting => {
            let (theta, _) = angles(simplex3(p - Vec3::splat(time * 0.1)));
            let (_, phi) = angles(simplex3(p - Vec3::splat(time * 0.5)));
            (theta, phi)
        }
    };
    safe_normalize(Vec3::new(phi.cos() * PARTICLE_X_STRETCH, theta, phi.sin()))
}

/// Spatial scale and temporal speed of the directional field, per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    /// Multiplier from world position to noise space.
    pub scale: Vec3,
    /// How fast the noise space scrolls per second of `time`.
    pub speed: Vec3,
}

impl NoiseParams {
    pub fn new(scale: Vec3, speed: Vec3) -> Self {
        Self { scale, speed }
    }

    /// Sample the field at `pos` and `time` with these parameters.
    #[inline]
    pub fn direction(&self, pos: Vec3, time: f32) -> Vec3 {
        direction(pos, self.scale, self.speed, time)
    }

    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.speed.is_finite()
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(0.005),
            speed: Vec3::splat(0.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn assert_unit(v: Vec3) {
        assert!((v.length() - 1.0).abs() < 1e-5, "{:?} has length {}", v, v.length());
    }

    #[test]
    fn test_direction_is_unit_length() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..2000 {
            let pos = Vec3::new(
                rng.gen_range(-1e4..1e4),
                rng.gen_range(-1e4..1e4),
                rng.gen_range(-1e4..1e4),
            );
            let time = rng.gen_range(0.0..1000.0);
            assert_unit(direction(pos, Vec3::splat(0.003), Vec3::new(0.1, 0.5, 2.0), time));
        }
    }

    #[test]
    fn test_direction_matches_formula() {
        let pos = Vec3::new(3.0, 7.0, -2.0);
        let scale = Vec3::new(0.1, 0.2, 0.3);
        let speed = Vec3::new(1.0, 0.5, 0.25);
        let n = simplex3(pos * scale - speed * 2.0);
        let phi = n * TWO_PI;
        let expected = Vec3::new(phi.cos(), n * -2.0 + 1.0, phi.sin()).normalize();
        let got = direction(pos, scale, speed, 2.0);
        assert!((got - expected).length() < 1e-6);
    }

    #[test]
    fn test_zero_scale_is_constant() {
        let a = direction(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::ZERO, 5.0);
        let b = direction(Vec3::new(-9.0, 4.0, 0.5), Vec3::ZERO, Vec3::ZERO, 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_particle_direction_is_unit_and_stretched() {
        let pos = Vec3::new(12.0, -4.0, 33.0);
        let dir = particle_direction(pos, 0.0, ParticleNoise::Static);
        assert_unit(dir);

        let n = simplex3(pos * PARTICLE_NOISE_SCALE);
        let phi = n * TWO_PI;
        let expected = Vec3::new(phi.cos() * 4.0, n * -2.0 + 1.0, phi.sin()).normalize();
        assert!((dir - expected).length() < 1e-6);
    }

    #[test]
    fn test_static_particle_field_ignores_time() {
        let pos = Vec3::new(5.0, 1.0, -8.0);
        assert_eq!(
            particle_direction(pos, 0.0, ParticleNoise::Static),
            particle_direction(pos, 100.0, ParticleNoise::Static)
        );
    }

    #[test]
    fn test_drifting_particle_field_moves() {
        let pos = Vec3::new(5.0, 1.0, -8.0);
        let a = particle_direction(pos, 0.0, ParticleNoise::Drifting);
        let b = particle_direction(pos, 10.0, ParticleNoise::Drifting);
        assert_unit(a);
        assert_unit(b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_safe_normalize_fallback() {
        assert_eq!(safe_normalize(Vec3::ZERO), Vec3::Y);
        assert_eq!(safe_normalize(Vec3::new(f32::NAN, 0.0, 0.0)), Vec3::Y);
        assert_eq!(direction(Vec3::splat(f32::NAN), Vec3::ONE, Vec3::ONE, 0.0), Vec3::Y);
    }

    #[test]
    fn test_vertical_component_exceeds_unit_range() {
        assert_eq!(angles(-1.0), (3.0, -TWO_PI));
        assert_eq!(angles(1.0), (-1.0, TWO_PI));

        // Negative samples push the raw vertical component above 1.
        let mut rng = SmallRng::seed_from_u64(11);
        let above = (0..2000)
            .map(|_| {
                let p = Vec3::new(
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                );
                angles(simplex3(p)).0
            })
            .filter(|theta| *theta > 1.0)
            .count();
        assert!(above > 0);
    }
}
