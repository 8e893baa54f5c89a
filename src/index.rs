//! Linear index <-> lattice coordinate mapping for 3D grids.
//!
//! Cells are stored x-fastest: `i = x + y * width + z * width * height`.

use crate::error::ConfigError;
use glam::{UVec3, Vec3};

/// Linear index of lattice coordinate `(x, y, z)`.
#[inline]
pub fn to_index(x: u32, y: u32, z: u32, width: u32, height: u32) -> usize {
    let (w, h) = (width as usize, height as usize);
    x as usize + y as usize * w + z as usize * w * h
}

/// Lattice coordinate of linear index `i`.
#[inline]
pub fn to_coord(i: usize, width: u32, height: u32) -> UVec3 {
    let (w, h) = (width as usize, height as usize);
    let z = i / (w * h);
    let y = (i / w) % h;
    let x = i % w;
    UVec3::new(x as u32, y as u32, z as u32)
}

/// Cell counts of a 3D lattice along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl GridDims {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// Same count on every axis.
    pub const fn cube(n: u32) -> Self {
        Self::new(n, n, n)
    }

    /// Total number of cells, or `None` if it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.depth as usize)
    }

    /// Total number of cells. Call only on validated dimensions.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject zero-sized axes and grids whose indices do not fit in `u32`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, count) in [('X', self.width), ('Y', self.height), ('Z', self.depth)] {
            if count == 0 {
                return Err(ConfigError::GridAxis { axis, count });
            }
        }
        match self.checked_len() {
            Some(n) if n <= u32::MAX as usize => Ok(()),
            _ => Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
                depth: self.depth,
            }),
        }
    }

    #[inline]
    pub fn index_of(&self, coord: UVec3) -> usize {
        to_index(coord.x, coord.y, coord.z, self.width, self.height)
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> UVec3 {
        to_coord(index, self.width, self.height)
    }

    /// Whether `coord` lies inside the lattice.
    pub fn contains(&self, coord: UVec3) -> bool {
        coord.x < self.width && coord.y < self.height && coord.z < self.depth
    }

    /// Local-space size of the lattice for a given cell size.
    pub fn extent(&self, cell_size: f32) -> Vec3 {
        self.as_vec3() * cell_size
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.width as f32, self.height as f32, self.depth as f32)
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self::cube(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_index() {
        assert_eq!(to_index(1, 1, 1, 4, 4), 21);
        assert_eq!(to_coord(21, 4, 4), UVec3::new(1, 1, 1));
    }

    #[test]
    fn test_round_trip_from_index() {
        for (w, h, d) in [(1, 1, 1), (4, 4, 4), (3, 5, 7), (16, 1, 9), (1, 13, 2)] {
            for i in 0..(w * h * d) as usize {
                let c = to_coord(i, w, h);
                assert!(c.x < w && c.y < h && c.z < d);
                assert_eq!(to_index(c.x, c.y, c.z, w, h), i);
            }
        }
    }

    #[test]
    fn test_round_trip_from_coord() {
        let dims = GridDims::new(6, 3, 4);
        for z in 0..10 {
            for y in 0..dims.height {
                for x in 0..dims.width {
                    let c = UVec3::new(x, y, z);
                    assert_eq!(dims.coord_of(dims.index_of(c)), c);
                }
            }
        }
    }

    #[test]
    fn test_x_is_fastest_axis() {
        let dims = GridDims::new(3, 2, 2);
        assert_eq!(dims.coord_of(1), UVec3::new(1, 0, 0));
        assert_eq!(dims.coord_of(3), UVec3::new(0, 1, 0));
        assert_eq!(dims.coord_of(6), UVec3::new(0, 0, 1));
    }

    #[test]
    fn test_validate_rejects_zero_axis() {
        let err = GridDims::new(4, 0, 4).validate().unwrap_err();
        assert_eq!(err, ConfigError::GridAxis { axis: 'Y', count: 0 });
    }

    #[test]
    fn test_validate_rejects_huge_grid() {
        let dims = GridDims::cube(u32::MAX);
        assert!(matches!(dims.validate(), Err(ConfigError::GridTooLarge { .. })));
    }

    #[test]
    fn test_extent() {
        assert_eq!(GridDims::new(2, 3, 4).extent(0.5), Vec3::new(1.0, 1.5, 2.0));
        assert_eq!(GridDims::new(2, 3, 4).len(), 24);
    }
}
