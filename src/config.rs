//! Simulation configuration.
//!
//! [`SimConfig`] holds every tunable the host can change between frames.
//! The simulation samples it once per frame and compares against the last
//! applied value to decide whether storage must be rebuilt.
//!
//! # Example
//!
//! ```ignore
//! let config = SimConfig::new()
//!     .with_particle_exponent(14)
//!     .with_grid(GridDims::new(32, 16, 32))
//!     .with_cell_size(2.0)
//!     .with_noise_speed(Vec3::splat(0.4));
//! config.validate()?;
//! ```

use crate::clock::FrameTime;
use crate::error::ConfigError;
use crate::field::{NoiseParams, ParticleNoise};
use crate::grid::GridParams;
use crate::index::GridDims;
use crate::kernel::{PARTICLE_BATCH, VOXEL_BATCH};
use crate::spawn::DEFAULT_SEED;
use crate::swarm::{StepParams, MAX_PARTICLE_EXPONENT, MIN_PARTICLE_EXPONENT};
use glam::{Mat4, Vec3};

/// Every per-frame input of the simulation core.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Particle count is `2^particle_exponent`, with the exponent in `10..=20`.
    pub particle_exponent: u32,
    /// Directional pull added to every particle, scaled by its normalized index.
    pub bias: Vec3,
    /// Whether particles see a frozen or a drifting field.
    pub particle_noise: ParticleNoise,
    /// Voxel grid cell counts.
    pub grid: GridDims,
    /// Edge length of one voxel in local units.
    pub cell_size: f32,
    /// Spatial scale and temporal speed of the voxel field.
    pub noise: NoiseParams,
    /// Local-to-world transform of the voxel grid.
    pub grid_transform: Mat4,
    /// Seed for particle spawn positions.
    pub seed: u64,
    /// Kernel batch size for particle kernels.
    pub particle_batch: usize,
    /// Kernel batch size for voxel kernels.
    pub voxel_batch: usize,
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particle_exponent(mut self, exponent: u32) -> Self {
        self.particle_exponent = exponent;
        self
    }

    pub fn with_bias(mut self, bias: Vec3) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_particle_noise(mut self, mode: ParticleNoise) -> Self {
        self.particle_noise = mode;
        self
    }

    pub fn with_grid(mut self, grid: GridDims) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_noise(mut self, noise: NoiseParams) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_noise_scale(mut self, scale: Vec3) -> Self {
        self.noise.scale = scale;
        self
    }

    pub fn with_noise_speed(mut self, speed: Vec3) -> Self {
        self.noise.speed = speed;
        self
    }

    pub fn with_grid_transform(mut self, transform: Mat4) -> Self {
        self.grid_transform = transform;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the kernel batch sizes. Results do not depend on them.
    pub fn with_batches(mut self, particle: usize, voxel: usize) -> Self {
        self.particle_batch = particle;
        self.voxel_batch = voxel;
        self
    }

    /// Number of particles, `2^particle_exponent`.
    pub fn particle_count(&self) -> usize {
        1usize.checked_shl(self.particle_exponent).unwrap_or(0)
    }

    /// Check every field against its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PARTICLE_EXPONENT..=MAX_PARTICLE_EXPONENT).contains(&self.particle_exponent) {
            return Err(ConfigError::ParticleExponent(self.particle_exponent));
        }
        self.grid.validate()?;
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !self.noise.is_finite() {
            return Err(ConfigError::NoiseParams);
        }
        for batch in [self.particle_batch, self.voxel_batch] {
            if batch == 0 {
                return Err(ConfigError::BatchSize(batch));
            }
        }
        Ok(())
    }

    /// Parameters for one particle step.
    pub fn step_params(&self, frame: FrameTime) -> StepParams {
        StepParams::new(frame.delta, frame.elapsed, self.bias).with_noise(self.particle_noise)
    }

    /// Parameters for one voxel field update.
    pub fn grid_params(&self, frame: FrameTime) -> GridParams {
        GridParams::new(frame.elapsed, self.noise, self.grid_transform)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_exponent: 16,
            bias: Vec3::new(0.0002, 0.0001, 0.0002),
            particle_noise: ParticleNoise::Static,
            grid: GridDims::default(),
            cell_size: 1.0,
            noise: NoiseParams::default(),
            grid_transform: Mat4::IDENTITY,
            seed: DEFAULT_SEED,
            particle_batch: PARTICLE_BATCH,
            voxel_batch: VOXEL_BATCH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count(), 65536);
        assert_eq!(config.grid.len(), 1_000_000);
    }

    #[test]
    fn test_exponent_bounds() {
        assert!(SimConfig::new().with_particle_exponent(10).validate().is_ok());
        assert!(SimConfig::new().with_particle_exponent(20).validate().is_ok());
        assert_eq!(
            SimConfig::new().with_particle_exponent(9).validate(),
            Err(ConfigError::ParticleExponent(9))
        );
        assert_eq!(
            SimConfig::new().with_particle_exponent(21).validate(),
            Err(ConfigError::ParticleExponent(21))
        );
    }

    #[test]
    fn test_huge_exponent_does_not_overflow() {
        assert_eq!(SimConfig::new().with_particle_exponent(200).particle_count(), 0);
    }

    #[test]
    fn test_cell_size_must_be_positive() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = SimConfig::new().with_cell_size(bad).validate().unwrap_err();
            assert!(matches!(err, ConfigError::CellSize(_)));
        }
    }

    #[test]
    fn test_zero_axis_rejected() {
        let err = SimConfig::new()
            .with_grid(GridDims::new(8, 8, 0))
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::GridAxis { axis: 'Z', count: 0 });
    }

    #[test]
    fn test_non_finite_noise_rejected() {
        let err = SimConfig::new()
            .with_noise_speed(Vec3::new(0.0, f32::NAN, 0.0))
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoiseParams);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let err = SimConfig::new().with_batches(64, 0).validate().unwrap_err();
        assert_eq!(err, ConfigError::BatchSize(0));
    }

    #[test]
    fn test_frame_params() {
        let config = SimConfig::new().with_bias(Vec3::X);
        let frame = FrameTime::new(3.0, 0.5, 6);
        let step = config.step_params(frame);
        assert_eq!(step.delta_time, 0.5);
        assert_eq!(step.time, 3.0);
        assert_eq!(step.bias, Vec3::X);
        assert_eq!(config.grid_params(frame).time, 3.0);
    }
}
