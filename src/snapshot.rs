//! Read-only frame output for rendering collaborators.
//!
//! Snapshots are copies taken after the end-of-frame barrier. A renderer can
//! hold one as long as it likes and upload it to GPU buffers; the simulation
//! keeps mutating its own storage independently.

use crate::index::GridDims;
use glam::{Mat4, Vec3, Vec4};

/// Edge length of the culling cube used for instanced particles.
pub const PARTICLE_BOUNDS_SIZE: f32 = 1000.0;

/// Axis-aligned box given by centre and full size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }
}

/// Particle positions and colors for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSnapshot {
    positions: Vec<Vec3>,
    colors: Vec<Vec4>,
}

impl ParticleSnapshot {
    pub(crate) fn new(positions: Vec<Vec3>, colors: Vec<Vec4>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self { positions, colors }
    }

    /// Number of particles, `N`.
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Positions as tightly packed `3 x f32` (12 bytes per particle).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as tightly packed `4 x f32` (16 bytes per particle).
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Fixed culling box centred on the origin.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(Vec3::ZERO, Vec3::splat(PARTICLE_BOUNDS_SIZE))
    }
}

/// Voxel positions and directions for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    dims: GridDims,
    cell_size: f32,
    generation: u64,
    transform: Mat4,
    positions: Vec<Vec3>,
    directions: Vec<Vec3>,
}

impl GridSnapshot {
    pub(crate) fn new(
        dims: GridDims,
        cell_size: f32,
        generation: u64,
        transform: Mat4,
        positions: Vec<Vec3>,
        directions: Vec<Vec3>,
    ) -> Self {
        debug_assert_eq!(positions.len(), directions.len());
        Self {
            dims,
            cell_size,
            generation,
            transform,
            positions,
            directions,
        }
    }

    /// Number of voxels, `M`.
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Build counter of the grid this was taken from. Positions only change
    /// when this does, so a renderer can skip re-uploading them otherwise.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Local-to-world transform the directions were evaluated with.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Local-space cell positions, fixed since the last build.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Unit field direction per cell, refreshed every frame.
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn direction_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directions)
    }

    /// Local-space box covering the lattice.
    pub fn bounds(&self) -> Bounds {
        let size = self.dims.extent(self.cell_size);
        Bounds::new(size * 0.5, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_byte_layout() {
        let snap = ParticleSnapshot::new(vec![Vec3::ONE; 3], vec![Vec4::ZERO; 3]);
        assert_eq!(snap.count(), 3);
        assert_eq!(snap.position_bytes().len(), 36);
        assert_eq!(snap.color_bytes().len(), 48);
    }

    #[test]
    fn test_grid_byte_layout_and_bounds() {
        let dims = GridDims::new(2, 4, 8);
        let snap = GridSnapshot::new(
            dims,
            0.5,
            1,
            Mat4::IDENTITY,
            vec![Vec3::ZERO; 64],
            vec![Vec3::Y; 64],
        );
        assert_eq!(snap.direction_bytes().len(), 64 * 12);
        assert_eq!(snap.bounds(), Bounds::new(Vec3::new(0.5, 1.0, 2.0), Vec3::new(1.0, 2.0, 4.0)));
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(Vec3::ZERO, Vec3::splat(2.0));
        assert!(b.contains(Vec3::new(1.0, -1.0, 0.0)));
        assert!(!b.contains(Vec3::new(1.1, 0.0, 0.0)));
    }
}
