//! Particle swarm driven by the directional noise field.
//!
//! Particles are stored as three parallel arrays (position, velocity, color)
//! of identical length `N`, where `N` is a power of two between 1024 and
//! 1048576. Each step runs two kernel invocations over all particles:
//!
//! 1. **Accelerate** - read the field at the particle's position and
//!    accumulate `10 * (dir + bias * i / N) * dt` into its velocity.
//! 2. **Integrate** - `position += velocity * dt`.
//!
//! Stage 2 starts only once stage 1 has finished for every particle.
//!
//! # Example
//!
//! ```ignore
//! let mut swarm = ParticleSwarm::new(DEFAULT_SEED, Dispatch::default());
//! swarm.configure(1 << 14)?;
//! swarm.step(StepParams::new(1.0 / 60.0, 0.0, Vec3::ZERO))?;
//! let snapshot = swarm.snapshot()?;
//! ```

use crate::clock::FrameTime;
use crate::config::SimConfig;
use crate::error::{try_alloc, ConfigError, ResourceError, SimError, StateError};
use crate::field::{particle_direction, ParticleNoise};
use crate::job::Slot;
use crate::kernel::Dispatch;
use crate::simulation::FrameSystem;
use crate::snapshot::ParticleSnapshot;
use crate::spawn::SpawnContext;
use glam::{Vec3, Vec4};

pub const MIN_PARTICLE_EXPONENT: u32 = 10;
pub const MAX_PARTICLE_EXPONENT: u32 = 20;
pub const MIN_PARTICLES: usize = 1 << MIN_PARTICLE_EXPONENT;
pub const MAX_PARTICLES: usize = 1 << MAX_PARTICLE_EXPONENT;

/// Gain applied to the per-frame acceleration.
pub const ACCELERATION_GAIN: f32 = 10.0;

/// Accept only powers of two in `[MIN_PARTICLES, MAX_PARTICLES]`.
pub fn validate_count(count: usize) -> Result<(), ConfigError> {
    if count.is_power_of_two() && (MIN_PARTICLES..=MAX_PARTICLES).contains(&count) {
        Ok(())
    } else {
        Err(ConfigError::ParticleCount(count))
    }
}

/// Inputs of one particle step, built fresh for every dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub delta_time: f32,
    pub time: f32,
    pub bias: Vec3,
    pub noise: ParticleNoise,
}

impl StepParams {
    pub fn new(delta_time: f32, time: f32, bias: Vec3) -> Self {
        Self {
            delta_time,
            time,
            bias,
            noise: ParticleNoise::Static,
        }
    }

    pub fn with_noise(mut self, noise: ParticleNoise) -> Self {
        self.noise = noise;
        self
    }
}

struct SwarmBuffers {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<Vec4>,
}

impl SwarmBuffers {
    fn allocate(count: usize, seed: u64, dispatch: Dispatch) -> Result<Self, ResourceError> {
        let mut positions = try_alloc("particle positions", count, Vec3::ZERO)?;
        let velocities = try_alloc("particle velocities", count, Vec3::ZERO)?;
        let colors = try_alloc("particle colors", count, Vec4::ZERO)?;

        dispatch.for_each(&mut positions, |i, p| {
            *p = SpawnContext::new(i, seed).random_spawn_position();
        });

        Ok(Self {
            positions,
            velocities,
            colors,
        })
    }

    fn step(mut self, dispatch: Dispatch, params: StepParams) -> Self {
        self.accelerate(dispatch, params);
        self.integrate(dispatch, params.delta_time);
        self
    }

    fn accelerate(&mut self, dispatch: Dispatch, params: StepParams) {
        let count = self.positions.len() as f32;
        dispatch.for_each_with(&mut self.velocities, &self.positions, |i, v, p| {
            let dir = particle_direction(*p, params.time, params.noise);
            let pull = params.bias * (i as f32 / count);
            *v += ACCELERATION_GAIN * (dir + pull) * params.delta_time;
        });
    }

    fn integrate(&mut self, dispatch: Dispatch, delta_time: f32) {
        dispatch.for_each_with(&mut self.positions, &self.velocities, |_, p, v| {
            *p += *v * delta_time;
        });
    }
}

/// Owner of the particle arrays and their kernels.
pub struct ParticleSwarm {
    seed: u64,
    dispatch: Dispatch,
    /// Count the arrays were last allocated for; 0 before `configure`.
    count: usize,
    buffers: Slot<SwarmBuffers>,
}

impl ParticleSwarm {
    pub fn new(seed: u64, dispatch: Dispatch) -> Self {
        Self {
            seed,
            dispatch,
            count: 0,
            buffers: Slot::empty("particle swarm"),
        }
    }

    /// Particle count of the current allocation, 0 if none.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn dispatcher(&self) -> Dispatch {
        self.dispatch
    }

    /// Batch size for later dispatches. Does not touch particle data.
    pub fn set_dispatcher(&mut self, dispatch: Dispatch) {
        self.dispatch = dispatch;
    }

    /// Seed used by the next reallocation.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn is_configured(&self) -> bool {
        self.buffers.is_ready() || self.buffers.is_in_flight()
    }

    /// Allocate storage for `count` particles.
    ///
    /// Does nothing and returns `false` when `count` matches the current
    /// allocation. Otherwise waits for any in-flight step, frees the old
    /// arrays, and allocates fresh ones with zero velocity and reseeded
    /// positions.
    pub fn configure(&mut self, count: usize) -> Result<bool, SimError> {
        validate_count(count)?;
        if count == self.count && self.is_configured() {
            return Ok(false);
        }
        self.reallocate(count)?;
        Ok(true)
    }

    /// Reallocate and reseed at the current count.
    pub fn reset(&mut self) -> Result<(), SimError> {
        if self.count == 0 {
            return Err(StateError::NotInitialized("particle swarm").into());
        }
        self.reallocate(self.count)
    }

    fn reallocate(&mut self, count: usize) -> Result<(), SimError> {
        self.count = 0;
        self.buffers.clear()?;
        let buffers = SwarmBuffers::allocate(count, self.seed, self.dispatch)?;
        self.buffers.replace(buffers)?;
        self.count = count;
        log::debug!("Particle swarm allocated for {} particles", count);
        Ok(())
    }

    /// Start a step on the worker pool and return immediately.
    ///
    /// Particle data is unavailable until [`join`](Self::join).
    pub fn dispatch(&mut self, params: StepParams) -> Result<(), SimError> {
        self.join()?;
        let dispatch = self.dispatch;
        self.buffers
            .launch(move |buffers| buffers.step(dispatch, params))?;
        log::trace!("Particle step dispatched (dt = {})", params.delta_time);
        Ok(())
    }

    /// Wait for the dispatched step, if any.
    ///
    /// If the worker was lost the particle data is gone and the swarm must
    /// be configured again.
    pub fn join(&mut self) -> Result<(), SimError> {
        if let Err(e) = self.buffers.settle() {
            self.count = 0;
            log::warn!("Particle storage lost: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Non-blocking: whether the last dispatched step has finished.
    pub fn poll(&mut self) -> bool {
        self.buffers.poll()
    }

    /// Dispatch one step and wait for it.
    pub fn step(&mut self, params: StepParams) -> Result<(), SimError> {
        self.dispatch(params)?;
        self.join()
    }

    pub fn positions(&self) -> Result<&[Vec3], StateError> {
        Ok(&self.buffers.ready()?.positions)
    }

    pub fn velocities(&self) -> Result<&[Vec3], StateError> {
        Ok(&self.buffers.ready()?.velocities)
    }

    pub fn colors(&self) -> Result<&[Vec4], StateError> {
        Ok(&self.buffers.ready()?.colors)
    }

    /// Join pending work and copy out positions and colors.
    pub fn snapshot(&mut self) -> Result<ParticleSnapshot, SimError> {
        self.join()?;
        let buffers = self.buffers.ready()?;
        Ok(ParticleSnapshot::new(
            buffers.positions.clone(),
            buffers.colors.clone(),
        ))
    }
}

impl FrameSystem for ParticleSwarm {
    fn init(&mut self, config: &SimConfig) -> Result<(), SimError> {
        self.refresh(config).map(|_| ())
    }

    fn refresh(&mut self, config: &SimConfig) -> Result<bool, SimError> {
        self.seed = config.seed;
        self.dispatch = Dispatch::new(config.particle_batch)?;
        self.configure(config.particle_count())
    }

    fn tick(&mut self, frame: FrameTime, config: &SimConfig) -> Result<(), SimError> {
        self.dispatch(config.step_params(frame))
    }

    fn join(&mut self) -> Result<(), SimError> {
        ParticleSwarm::join(self)
    }

    fn shutdown(&mut self) -> Result<(), SimError> {
        self.count = 0;
        self.buffers.clear()?;
        log::debug!("Particle swarm released");
        Ok(())
    }
}
