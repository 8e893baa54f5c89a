//! Frame host tying the particle swarm and the voxel grid together.
//!
//! A frame has two halves. [`Simulation::begin_frame`] applies pending
//! configuration changes (rebuilding storage if needed) and dispatches both
//! systems' kernels without waiting. [`Simulation::end_frame`] is the
//! barrier: it joins all outstanding work and hands out read-only snapshots.
//! The host is free to do other work in between.

use crate::clock::FrameTime;
use crate::config::SimConfig;
use crate::error::{ConfigError, SimError};
use crate::grid::VoxelGrid;
use crate::kernel::Dispatch;
use crate::snapshot::{GridSnapshot, ParticleSnapshot};
use crate::swarm::ParticleSwarm;
use glam::Mat4;

/// A container that takes part in the frame loop.
pub trait FrameSystem {
    /// Allocate storage for `config`. Called once, synchronously.
    fn init(&mut self, config: &SimConfig) -> Result<(), SimError>;

    /// Bring storage in line with `config`. Returns whether it was rebuilt.
    ///
    /// Must join any in-flight work before freeing storage.
    fn refresh(&mut self, config: &SimConfig) -> Result<bool, SimError>;

    /// Dispatch this frame's kernels and return without waiting.
    fn tick(&mut self, frame: FrameTime, config: &SimConfig) -> Result<(), SimError>;

    /// Wait for everything dispatched by [`tick`](Self::tick).
    fn join(&mut self) -> Result<(), SimError>;

    /// Join and release all storage.
    fn shutdown(&mut self) -> Result<(), SimError>;
}

/// Everything a renderer needs from one frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub frame: FrameTime,
    pub particles: ParticleSnapshot,
    pub grid: GridSnapshot,
}

/// Owner of the configuration and both containers.
pub struct Simulation {
    config: SimConfig,
    swarm: ParticleSwarm,
    grid: VoxelGrid,
    /// Frame dispatched by `begin_frame` and not yet ended.
    in_flight: Option<FrameTime>,
    last_frame: FrameTime,
}

impl Simulation {
    /// Validate `config` and allocate both containers.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut swarm = ParticleSwarm::new(config.seed, Dispatch::new(config.particle_batch)?);
        let mut grid = VoxelGrid::new(Dispatch::new(config.voxel_batch)?);
        swarm.init(&config)?;
        grid.init(&config)?;

        log::info!(
            "Simulation ready: {} particles, {}x{}x{} voxels",
            swarm.count(),
            config.grid.width,
            config.grid.height,
            config.grid.depth
        );

        Ok(Self {
            config,
            swarm,
            grid,
            in_flight: None,
            last_frame: FrameTime::default(),
        })
    }

    /// The last valid configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replace the configuration, taking effect at the next `begin_frame`.
    ///
    /// An invalid configuration is logged and rejected; the previous one
    /// stays active.
    pub fn apply_config(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Rejected configuration: {}", e);
            return Err(e);
        }
        self.config = config;
        Ok(())
    }

    /// Move the voxel grid. Applies from the next dispatched update.
    pub fn set_grid_transform(&mut self, transform: Mat4) {
        self.config.grid_transform = transform;
    }

    pub fn swarm(&self) -> &ParticleSwarm {
        &self.swarm
    }

    pub fn swarm_mut(&mut self) -> &mut ParticleSwarm {
        &mut self.swarm
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut VoxelGrid {
        &mut self.grid
    }

    pub fn is_frame_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply configuration changes and dispatch both systems.
    pub fn begin_frame(&mut self, frame: FrameTime) -> Result<(), SimError> {
        if self.in_flight.is_some() {
            self.join()?;
        }

        if self.swarm.refresh(&self.config)? {
            log::info!("Particle count changed to {}", self.swarm.count());
        }
        if self.grid.refresh(&self.config)? {
            log::info!("Voxel grid rebuilt ({} cells)", self.grid.count());
        }

        self.swarm.tick(frame, &self.config)?;
        self.grid.tick(frame, &self.config)?;
        self.in_flight = Some(frame);
        Ok(())
    }

    /// Barrier: wait for this frame's work and copy out the results.
    pub fn end_frame(&mut self) -> Result<FrameOutput, SimError> {
        self.join()?;
        Ok(FrameOutput {
            frame: self.last_frame,
            particles: self.swarm.snapshot()?,
            grid: self.grid.snapshot()?,
        })
    }

    /// Run one whole frame.
    pub fn frame(&mut self, frame: FrameTime) -> Result<FrameOutput, SimError> {
        self.begin_frame(frame)?;
        self.end_frame()
    }

    fn join(&mut self) -> Result<(), SimError> {
        // Join both even if the first fails, so nothing is left running.
        let swarm = FrameSystem::join(&mut self.swarm);
        let grid = FrameSystem::join(&mut self.grid);
        if let Some(frame) = self.in_flight.take() {
            self.last_frame = frame;
        }
        swarm.and(grid)
    }

    /// Join outstanding work and release all storage.
    pub fn shutdown(&mut self) -> Result<(), SimError> {
        let joined = self.join();
        self.swarm.shutdown()?;
        self.grid.shutdown()?;
        log::info!("Simulation shut down");
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GridDims;
    use glam::Vec3;

    fn small() -> SimConfig {
        SimConfig::new()
            .with_particle_exponent(10)
            .with_grid(GridDims::new(6, 4, 5))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Simulation::new(small().with_cell_size(-1.0)).err().unwrap();
        assert!(matches!(err, SimError::Config(ConfigError::CellSize(_))));
    }

    #[test]
    fn test_frame_output_shapes() {
        let mut sim = Simulation::new(small()).unwrap();
        let out = sim.frame(FrameTime::new(0.016, 0.016, 1)).unwrap();
        assert_eq!(out.frame.frame, 1);
        assert_eq!(out.particles.count(), 1024);
        assert_eq!(out.grid.count(), 120);
        assert!(!sim.is_frame_in_flight());
    }

    #[test]
    fn test_rejected_config_keeps_running() {
        let mut sim = Simulation::new(small()).unwrap();
        let before = sim.config().clone();
        assert!(sim.apply_config(small().with_particle_exponent(25)).is_err());
        assert_eq!(sim.config(), &before);
        let out = sim.frame(FrameTime::new(0.016, 0.016, 1)).unwrap();
        assert_eq!(out.particles.count(), 1024);
    }

    #[test]
    fn test_config_change_applies_next_frame() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.apply_config(small().with_particle_exponent(11).with_cell_size(2.0))
            .unwrap();
        assert_eq!(sim.swarm().count(), 1024);

        let out = sim.frame(FrameTime::new(0.016, 0.016, 1)).unwrap();
        assert_eq!(out.particles.count(), 2048);
        assert_eq!(out.grid.cell_size(), 2.0);
        assert_eq!(out.grid.generation(), 2);
    }

    #[test]
    fn test_grid_transform_reaches_snapshot() {
        let mut sim = Simulation::new(small()).unwrap();
        let transform = Mat4::from_translation(Vec3::new(3.0, 0.0, -2.0));
        sim.set_grid_transform(transform);
        let out = sim.frame(FrameTime::new(0.5, 0.016, 1)).unwrap();
        assert_eq!(out.grid.transform(), transform);
    }

    #[test]
    fn test_begin_twice_joins_previous_frame() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.begin_frame(FrameTime::new(0.016, 0.016, 1)).unwrap();
        sim.begin_frame(FrameTime::new(0.032, 0.016, 2)).unwrap();
        let out = sim.end_frame().unwrap();
        assert_eq!(out.frame.frame, 2);
    }

    #[test]
    fn test_shutdown_releases_storage() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.begin_frame(FrameTime::new(0.016, 0.016, 1)).unwrap();
        sim.shutdown().unwrap();
        assert_eq!(sim.swarm().count(), 0);
        assert!(!sim.grid().is_built());
    }
}
