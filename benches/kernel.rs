//! Benchmarks for the noise field and the per-frame kernels.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Vec3};

use swarmfield::field::{direction, particle_direction};
use swarmfield::noise::simplex3;
use swarmfield::{
    Dispatch, GridDims, GridParams, NoiseParams, ParticleNoise, ParticleSwarm, StepParams,
    VoxelGrid,
};

fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise");
    let p = Vec3::new(12.3, -4.5, 67.8);

    group.bench_function("simplex3", |b| b.iter(|| black_box(simplex3(black_box(p)))));

    group.bench_function("direction", |b| {
        let scale = Vec3::splat(0.005);
        let speed = Vec3::splat(0.1);
        b.iter(|| black_box(direction(black_box(p), scale, speed, 1.5)))
    });

    group.bench_function("particle_direction", |b| {
        b.iter(|| black_box(particle_direction(black_box(p), 1.5, ParticleNoise::Static)))
    });

    group.finish();
}

fn bench_swarm_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("swarm_step");
    group.sample_size(20);

    for exponent in [12u32, 16, 18] {
        let mut swarm = ParticleSwarm::new(1, Dispatch::default());
        swarm.configure(1 << exponent).unwrap();
        let params = StepParams::new(1.0 / 60.0, 0.0, Vec3::new(0.0002, 0.0001, 0.0002));

        group.bench_with_input(
            BenchmarkId::new("particles", 1usize << exponent),
            &params,
            |b, &params| b.iter(|| swarm.step(params).unwrap()),
        );
    }

    group.finish();
}

fn bench_grid_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_update");
    group.sample_size(20);

    for axis in [16u32, 32, 64] {
        let noise = NoiseParams::default();
        let mut grid = VoxelGrid::new(Dispatch::new(32).unwrap());
        grid.build(GridDims::cube(axis), 1.0, noise).unwrap();
        let params = GridParams::new(1.0, noise, Mat4::from_rotation_y(0.3));

        group.bench_with_input(BenchmarkId::new("cells", axis.pow(3)), &params, |b, &params| {
            b.iter(|| grid.update(params).unwrap())
        });
    }

    group.finish();
}

fn bench_batch_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_size");
    group.sample_size(20);

    for batch in [1usize, 32, 64, 1024] {
        let mut swarm = ParticleSwarm::new(1, Dispatch::new(batch).unwrap());
        swarm.configure(1 << 16).unwrap();
        let params = StepParams::new(1.0 / 60.0, 0.0, Vec3::ZERO);

        group.bench_with_input(BenchmarkId::new("batch", batch), &params, |b, &params| {
            b.iter(|| swarm.step(params).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_noise,
    bench_swarm_step,
    bench_grid_update,
    bench_batch_size,
);
criterion_main!(benches);
