//! Error types for swarmfield.
//!
//! Three families of failure exist: bad configuration (recoverable, the
//! previous configuration keeps running), resource failure (fatal, storage
//! could not be obtained) and state misuse (reading output that does not
//! exist yet).

use std::collections::TryReserveError;
use std::fmt;

/// A configuration value outside its supported range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Particle count is not a power of two in `[MIN_PARTICLES, MAX_PARTICLES]`.
    ParticleCount(usize),
    /// Particle exponent outside `10..=20`.
    ParticleExponent(u32),
    /// A grid axis has zero cells.
    GridAxis { axis: char, count: u32 },
    /// The grid has more cells than can be indexed.
    GridTooLarge { width: u32, height: u32, depth: u32 },
    /// Cell size is zero, negative or not finite.
    CellSize(f32),
    /// A kernel batch size of zero.
    BatchSize(usize),
    /// Noise scale or speed contains a non-finite component.
    NoiseParams,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParticleCount(n) => write!(
                f,
                "Particle count {} must be a power of two between 1024 and 1048576",
                n
            ),
            ConfigError::ParticleExponent(e) => {
                write!(f, "Particle exponent {} must be between 10 and 20", e)
            }
            ConfigError::GridAxis { axis, count } => {
                write!(f, "Grid axis {} has {} cells, at least 1 is required", axis, count)
            }
            ConfigError::GridTooLarge { width, height, depth } => write!(
                f,
                "Grid of {}x{}x{} cells is too large to index",
                width, height, depth
            ),
            ConfigError::CellSize(s) => write!(f, "Cell size {} must be positive and finite", s),
            ConfigError::BatchSize(b) => write!(f, "Batch size {} must be at least 1", b),
            ConfigError::NoiseParams => write!(f, "Noise scale and speed must be finite"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Backing storage could not be obtained or returned.
#[derive(Debug)]
pub enum ResourceError {
    /// Allocation of a simulation array failed.
    Allocation {
        what: &'static str,
        count: usize,
        source: TryReserveError,
    },
    /// A dispatched job ended without handing its storage back.
    WorkerLost(&'static str),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Allocation { what, count, source } => {
                write!(f, "Failed to allocate {} {}: {}", count, what, source)
            }
            ResourceError::WorkerLost(what) => {
                write!(f, "Worker for {} exited without returning its storage", what)
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Allocation { source, .. } => Some(source),
            ResourceError::WorkerLost(_) => None,
        }
    }
}

/// Simulation output was requested when none is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Nothing has been configured or built yet.
    NotInitialized(&'static str),
    /// A dispatched kernel still owns the storage; join first.
    InFlight(&'static str),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NotInitialized(what) => {
                write!(f, "{} has not been initialized. Configure or build it first.", what)
            }
            StateError::InFlight(what) => {
                write!(f, "{} is being updated. Join the pending frame first.", what)
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Any error raised by the simulation core.
#[derive(Debug)]
pub enum SimError {
    Config(ConfigError),
    Resource(ResourceError),
    State(StateError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(e) => write!(f, "Configuration error: {}", e),
            SimError::Resource(e) => write!(f, "Resource error: {}", e),
            SimError::State(e) => write!(f, "State error: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Config(e) => Some(e),
            SimError::Resource(e) => Some(e),
            SimError::State(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Config(e)
    }
}

impl From<ResourceError> for SimError {
    fn from(e: ResourceError) -> Self {
        SimError::Resource(e)
    }
}

impl From<StateError> for SimError {
    fn from(e: StateError) -> Self {
        SimError::State(e)
    }
}

/// Allocate `count` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(
    what: &'static str,
    count: usize,
    value: T,
) -> Result<Vec<T>, ResourceError> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|source| ResourceError::Allocation { what, count, source })?;
    v.resize(count, value);
    Ok(v)
}
