//! Headless runner.
//!
//! Usage: `swarmfield [particle_exponent] [grid_axis] [frames]`
//!
//! Defaults to 2^16 particles, a 64^3 grid and 600 frames. Set `RUST_LOG`
//! to `debug` or `trace` for per-frame detail.

use glam::{Mat4, UVec3, Vec3};
use swarmfield::{FrameClock, GridDims, SimConfig, SimError, Simulation};

/// Grid spin in radians per second.
const GRID_SPIN: f32 = 0.1;

const REPORT_EVERY: u64 = 60;

fn arg<T: std::str::FromStr>(n: usize, default: T) -> T {
    std::env::args()
        .nth(n)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn run() -> Result<(), SimError> {
    let exponent: u32 = arg(1, 16);
    let axis: u32 = arg(2, 64);
    let frames: u64 = arg(3, 600);

    let config = SimConfig::new()
        .with_particle_exponent(exponent)
        .with_grid(GridDims::cube(axis));
    let mut sim = Simulation::new(config)?;
    let mut clock = FrameClock::fixed(1.0 / 60.0);

    // Rotate about the grid centre so the lattice spins in place.
    let center = sim.config().grid.extent(sim.config().cell_size) * 0.5;

    for _ in 0..frames {
        let frame = clock.tick();
        sim.set_grid_transform(
            Mat4::from_translation(center)
                * Mat4::from_rotation_y(frame.elapsed * GRID_SPIN)
                * Mat4::from_translation(-center),
        );
        let out = sim.frame(frame)?;

        if frame.frame % REPORT_EVERY == 0 {
            let voxel = sim.grid().voxel_at(UVec3::splat(axis / 2))?;
            let first = out.particles.positions().first().copied().unwrap_or(Vec3::ZERO);
            log::info!(
                "frame {} ({:.1} steps/s): particle[0] at {:.2}",
                frame.frame,
                clock.fps(),
                first
            );
            if let Some(voxel) = voxel {
                log::info!("{}", voxel);
            }
        }
    }

    sim.shutdown()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
