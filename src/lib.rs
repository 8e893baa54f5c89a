//! # swarmfield - noise-driven particle swarms and voxel vector fields
//!
//! CPU data-parallel simulation of two independent systems sharing one
//! directional noise field:
//!
//! - a **particle swarm** of `2^k` particles (`k` in `10..=20`) accelerated by
//!   the field every frame, and
//! - a **voxel grid** of `width * height * depth` cells, each re-sampling the
//!   field at its world-transformed position every frame.
//!
//! Both systems run their kernels on the rayon pool. A frame dispatches both
//! without waiting and joins them at an explicit barrier before anything
//! reads the results.
//!
//! ## Quick Start
//!
//! ```ignore
//! use swarmfield::prelude::*;
//!
//! fn main() -> Result<(), SimError> {
//!     let config = SimConfig::new()
//!         .with_particle_exponent(14)
//!         .with_grid(GridDims::cube(32));
//!     let mut sim = Simulation::new(config)?;
//!     let mut clock = FrameClock::fixed(1.0 / 60.0);
//!
//!     for _ in 0..600 {
//!         let out = sim.frame(clock.tick())?;
//!         upload(out.particles.position_bytes(), out.grid.direction_bytes());
//!     }
//!     sim.shutdown()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### The field
//!
//! [`field::direction`] maps a point, a per-axis scale and speed, and a time
//! to a unit vector. A simplex sample `n` (about `[-1, 1]`) becomes a
//! vertical component in about `[-1, 3]` and an azimuth in about
//! `[-2pi, 2pi]`; the result is normalized afterwards:
//!
//! ```text
//! n     = simplex(pos * scale - speed * time)
//! theta = -2n + 1
//! phi   = 2pi * n
//! dir   = normalize(cos phi, theta, sin phi)
//! ```
//!
//! ### Frames
//!
//! [`Simulation::begin_frame`] applies configuration changes and dispatches;
//! [`Simulation::end_frame`] joins and returns a [`FrameOutput`]. Storage
//! changes (particle count, grid shape) always wait for in-flight work first.
//!
//! ### Configuration
//!
//! [`SimConfig`] is validated whenever it is applied. A rejected
//! configuration is logged and the last valid one stays active.
//!
//! ## Feature Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`noise`] | 3D simplex noise |
//! | [`field`] | Directional field, particle field modes |
//! | [`index`] | Linear index to lattice coordinate mapping |
//! | [`kernel`] | Batched parallel-for over arrays |
//! | [`swarm`] | [`ParticleSwarm`] |
//! | [`grid`] | [`VoxelGrid`], [`Voxel`] |
//! | [`snapshot`] | Read-only frame output with byte views |
//! | [`clock`] | [`FrameClock`] |

pub mod clock;
pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod index;
pub mod job;
pub mod kernel;
pub mod noise;
mod simulation;
pub mod snapshot;
pub mod spawn;
pub mod swarm;

pub use bytemuck;
pub use clock::{FrameClock, FrameTime};
pub use config::SimConfig;
pub use error::{ConfigError, ResourceError, SimError, StateError};
pub use field::{NoiseParams, ParticleNoise};
pub use glam::{Mat4, UVec3, Vec3, Vec4};
pub use grid::{GridParams, Voxel, VoxelGrid};
pub use index::GridDims;
pub use kernel::Dispatch;
pub use simulation::{FrameOutput, FrameSystem, Simulation};
pub use snapshot::{Bounds, GridSnapshot, ParticleSnapshot};
pub use spawn::SpawnContext;
pub use swarm::{ParticleSwarm, StepParams};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use swarmfield::prelude::*;
/// ```
///
/// This imports:
/// - [`Simulation`] and [`SimConfig`] - the frame host and its settings
/// - [`FrameClock`] - frame timing
/// - [`GridDims`], [`NoiseParams`], [`ParticleNoise`] - configuration values
/// - [`SimError`] - the top-level error
/// - [`Vec3`], [`Vec4`], [`Mat4`] - glam types
pub mod prelude {
    pub use crate::clock::{FrameClock, FrameTime};
    pub use crate::config::SimConfig;
    pub use crate::error::{ConfigError, SimError};
    pub use crate::field::{NoiseParams, ParticleNoise};
    pub use crate::grid::{Voxel, VoxelGrid};
    pub use crate::index::GridDims;
    pub use crate::simulation::{FrameOutput, FrameSystem, Simulation};
    pub use crate::snapshot::{GridSnapshot, ParticleSnapshot};
    pub use crate::swarm::ParticleSwarm;
    pub use crate::{Mat4, UVec3, Vec3, Vec4};
}
