//! Data-parallel kernel dispatch.
//!
//! A kernel invocation runs a per-element closure over an index range,
//! fanned out across the rayon pool in batches of `batch` elements. Every
//! call returns only after all elements are done, so two consecutive calls
//! form a happens-before edge. The batch size only affects scheduling: any
//! batch size produces the same results.

use crate::error::ConfigError;
use rayon::prelude::*;

/// Batch size used by the particle swarm.
pub const PARTICLE_BATCH: usize = 64;

/// Batch size used by the voxel grid.
pub const VOXEL_BATCH: usize = 32;

/// Parallel-for dispatcher with a fixed batch granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
    batch: usize,
}

impl Dispatch {
    /// Create a dispatcher. `batch` must be at least 1.
    pub fn new(batch: usize) -> Result<Self, ConfigError> {
        if batch == 0 {
            return Err(ConfigError::BatchSize(batch));
        }
        Ok(Self { batch })
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Run `f(i, &mut out[i])` for every element.
    pub fn for_each<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        let batch = self.batch;
        out.par_chunks_mut(batch)
            .enumerate()
            .for_each(|(chunk, items)| {
                let base = chunk * batch;
                for (k, item) in items.iter_mut().enumerate() {
                    f(base + k, item);
                }
            });
    }

    /// Run `f(i, &mut out[i], &input[i])` for every element.
    pub fn for_each_with<T, U, F>(&self, out: &mut [T], input: &[U], f: F)
    where
        T: Send,
        U: Sync,
        F: Fn(usize, &mut T, &U) + Sync + Send,
    {
        debug_assert_eq!(out.len(), input.len());
        let batch = self.batch;
        out.par_chunks_mut(batch)
            .zip(input.par_chunks(batch))
            .enumerate()
            .for_each(|(chunk, (items, inputs))| {
                let base = chunk * batch;
                for (k, (item, x)) in items.iter_mut().zip(inputs).enumerate() {
                    f(base + k, item, x);
                }
            });
    }

    /// Run `f(i, &mut a[i], &mut b[i])` for every element.
    pub fn for_each_pair<T, U, F>(&self, a: &mut [T], b: &mut [U], f: F)
    where
        T: Send,
        U: Send,
        F: Fn(usize, &mut T, &mut U) + Sync + Send,
    {
        debug_assert_eq!(a.len(), b.len());
        let batch = self.batch;
        a.par_chunks_mut(batch)
            .zip(b.par_chunks_mut(batch))
            .enumerate()
            .for_each(|(chunk, (xs, ys))| {
                let base = chunk * batch;
                for (k, (x, y)) in xs.iter_mut().zip(ys.iter_mut()).enumerate() {
                    f(base + k, x, y);
                }
            });
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self { batch: PARTICLE_BATCH }
    }
}
