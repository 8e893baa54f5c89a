//! Voxel grid sampling the directional noise field.
//!
//! The grid is a fixed lattice of `width * height * depth` cells. Cell
//! positions are computed once when the grid is built and stay in local
//! space; every frame the field is re-evaluated at each cell's
//! world-transformed position and the resulting direction is written back
//! into the voxel and into a flat direction array for rendering.
//!
//! Changing the lattice dimensions or the cell size rebuilds the whole grid
//! synchronously. Per-frame updates run as fire-and-forget jobs that are
//! joined at the end of the frame.

use crate::clock::FrameTime;
use crate::config::SimConfig;
use crate::error::{try_alloc, ConfigError, ResourceError, SimError, StateError};
use crate::field::NoiseParams;
use crate::index::GridDims;
use crate::job::Slot;
use crate::kernel::Dispatch;
use crate::simulation::FrameSystem;
use crate::snapshot::GridSnapshot;
use glam::{Mat4, UVec3, Vec3};
use std::fmt;

/// One lattice cell.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Voxel {
    /// Lattice coordinate.
    pub coord: UVec3,
    /// Linear index, consistent with `coord` under the grid's [`GridDims`].
    pub index: u32,
    /// Local-space position, `coord * cell_size`.
    pub position: Vec3,
    /// Field direction at this cell for the current frame.
    pub velocity: Vec3,
}

impl fmt::Display for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Voxel {},{},{}_Velocity={}",
            self.coord.x, self.coord.y, self.coord.z, self.velocity
        )
    }
}

/// Inputs of one field update, built fresh for every dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridParams {
    pub time: f32,
    pub noise: NoiseParams,
    /// Local-to-world transform applied to cell positions before sampling.
    pub transform: Mat4,
}

impl GridParams {
    pub fn new(time: f32, noise: NoiseParams, transform: Mat4) -> Self {
        Self {
            time,
            noise,
            transform,
        }
    }
}

struct GridBuffers {
    transform: Mat4,
    voxels: Vec<Voxel>,
    positions: Vec<Vec3>,
    directions: Vec<Vec3>,
}

impl GridBuffers {
    fn build(
        dims: GridDims,
        cell_size: f32,
        noise: NoiseParams,
        dispatch: Dispatch,
    ) -> Result<Self, ResourceError> {
        let count = dims.len();
        let mut voxels = try_alloc("voxels", count, Voxel::default())?;
        let mut positions = try_alloc("voxel positions", count, Vec3::ZERO)?;
        let mut directions = try_alloc("voxel directions", count, Vec3::ZERO)?;

        dispatch.for_each_pair(&mut voxels, &mut directions, |i, voxel, dir| {
            let coord = dims.coord_of(i);
            let position = coord.as_vec3() * cell_size;
            let velocity = noise.direction(position, 0.0);
            *voxel = Voxel {
                coord,
                index: i as u32,
                position,
                velocity,
            };
            *dir = velocity;
        });
        dispatch.for_each_with(&mut positions, &voxels, |_, p, voxel| *p = voxel.position);

        Ok(Self {
            transform: Mat4::IDENTITY,
            voxels,
            positions,
            directions,
        })
    }

    fn update(mut self, dispatch: Dispatch, params: GridParams) -> Self {
        dispatch.for_each_pair(&mut self.voxels, &mut self.directions, |_, voxel, dir| {
            let world = params.transform.transform_point3(voxel.position);
            voxel.velocity = params.noise.direction(world, params.time);
            *dir = voxel.velocity;
        });
        self.transform = params.transform;
        self
    }
}

/// Owner of the voxel arrays and their kernels.
pub struct VoxelGrid {
    dispatch: Dispatch,
    /// Dimensions and cell size of the current build.
    shape: Option<(GridDims, f32)>,
    generation: u64,
    buffers: Slot<GridBuffers>,
}

impl VoxelGrid {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            shape: None,
            generation: 0,
            buffers: Slot::empty("voxel grid"),
        }
    }

    pub fn is_built(&self) -> bool {
        self.shape.is_some() && (self.buffers.is_ready() || self.buffers.is_in_flight())
    }

    /// Lattice dimensions of the current build.
    pub fn dims(&self) -> Option<GridDims> {
        self.shape.map(|(dims, _)| dims)
    }

    pub fn cell_size(&self) -> Option<f32> {
        self.shape.map(|(_, size)| size)
    }

    /// Number of voxels, 0 before the first build.
    pub fn count(&self) -> usize {
        self.dims().map_or(0, |d| d.len())
    }

    /// Incremented by every build.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dispatcher(&self) -> Dispatch {
        self.dispatch
    }

    pub fn set_dispatcher(&mut self, dispatch: Dispatch) {
        self.dispatch = dispatch;
    }

    /// Discard the current grid and build a new one. Blocks until done.
    ///
    /// Each voxel's velocity is seeded from the field at its local position
    /// with no time offset.
    pub fn build(
        &mut self,
        dims: GridDims,
        cell_size: f32,
        noise: NoiseParams,
    ) -> Result<(), SimError> {
        dims.validate()?;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::CellSize(cell_size).into());
        }
        if !noise.is_finite() {
            return Err(ConfigError::NoiseParams.into());
        }

        self.shape = None;
        self.buffers.clear()?;
        let buffers = GridBuffers::build(dims, cell_size, noise, self.dispatch)?;
        self.buffers.replace(buffers)?;
        self.shape = Some((dims, cell_size));
        self.generation += 1;
        log::debug!(
            "Voxel grid built: {}x{}x{} cells of size {} (generation {})",
            dims.width,
            dims.height,
            dims.depth,
            cell_size,
            self.generation
        );
        Ok(())
    }

    /// Build only if the dimensions or cell size differ from the current grid.
    pub fn ensure(
        &mut self,
        dims: GridDims,
        cell_size: f32,
        noise: NoiseParams,
    ) -> Result<bool, SimError> {
        if self.is_built() && self.shape == Some((dims, cell_size)) {
            return Ok(false);
        }
        self.build(dims, cell_size, noise)?;
        Ok(true)
    }

    /// Start a field update on the worker pool and return immediately.
    pub fn dispatch(&mut self, params: GridParams) -> Result<(), SimError> {
        self.join()?;
        let dispatch = self.dispatch;
        self.buffers
            .launch(move |buffers| buffers.update(dispatch, params))?;
        log::trace!("Voxel update dispatched (t = {})", params.time);
        Ok(())
    }

    /// Wait for the dispatched update, if any.
    ///
    /// If the worker was lost the grid is gone and must be built again.
    pub fn join(&mut self) -> Result<(), SimError> {
        if let Err(e) = self.buffers.settle() {
            self.shape = None;
            log::warn!("Voxel grid storage lost: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Non-blocking: whether the last dispatched update has finished.
    pub fn poll(&mut self) -> bool {
        self.buffers.poll()
    }

    /// Dispatch one update and wait for it.
    pub fn update(&mut self, params: GridParams) -> Result<(), SimError> {
        self.dispatch(params)?;
        self.join()
    }

    pub fn voxels(&self) -> Result<&[Voxel], StateError> {
        Ok(&self.buffers.ready()?.voxels)
    }

    pub fn positions(&self) -> Result<&[Vec3], StateError> {
        Ok(&self.buffers.ready()?.positions)
    }

    pub fn directions(&self) -> Result<&[Vec3], StateError> {
        Ok(&self.buffers.ready()?.directions)
    }

    /// Voxel at linear `index`, `None` if out of range.
    pub fn voxel(&self, index: usize) -> Result<Option<&Voxel>, StateError> {
        Ok(self.voxels()?.get(index))
    }

    /// Voxel at lattice coordinate `coord`, `None` if outside the lattice.
    pub fn voxel_at(&self, coord: UVec3) -> Result<Option<&Voxel>, StateError> {
        let voxels = self.voxels()?;
        Ok(self
            .dims()
            .filter(|dims| dims.contains(coord))
            .and_then(|dims| voxels.get(dims.index_of(coord))))
    }

    /// Join pending work and copy out positions and directions.
    pub fn snapshot(&mut self) -> Result<GridSnapshot, SimError> {
        self.join()?;
        let buffers = self.buffers.ready()?;
        let (dims, cell_size) = self
            .shape
            .ok_or(StateError::NotInitialized("voxel grid"))?;
        Ok(GridSnapshot::new(
            dims,
            cell_size,
            self.generation,
            buffers.transform,
            buffers.positions.clone(),
            buffers.directions.clone(),
        ))
    }
}

impl FrameSystem for VoxelGrid {
    fn init(&mut self, config: &SimConfig) -> Result<(), SimError> {
        self.refresh(config).map(|_| ())
    }

    fn refresh(&mut self, config: &SimConfig) -> Result<bool, SimError> {
        self.dispatch = Dispatch::new(config.voxel_batch)?;
        self.ensure(config.grid, config.cell_size, config.noise)
    }

    fn tick(&mut self, frame: FrameTime, config: &SimConfig) -> Result<(), SimError> {
        self.dispatch(config.grid_params(frame))
    }

    fn join(&mut self) -> Result<(), SimError> {
        VoxelGrid::join(self)
    }

    fn shutdown(&mut self) -> Result<(), SimError> {
        self.shape = None;
        self.buffers.clear()?;
        log::debug!("Voxel grid released");
        Ok(())
    }
}
