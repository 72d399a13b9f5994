// Benchmarks for volume build and path queries.
//
// Run with: cargo bench -p octnav_volume
//
// The scene is a set of static pillars plus a row of dynamic crates, laid
// out deterministically so runs are comparable. Grid sizes are cubic powers
// of two so octree leaves align with cells.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec3;
use octnav_volume::{
    ActorId, CategoryMask, GridCoord, NavVolume, ObstacleScene, PathRequest, VolumeConfig,
    VolumeTransform,
};
use std::hint::black_box;

const CELL: f32 = 100.0;

/// Static pillars every fourth column, with dynamic crates between them.
fn pillar_scene(side: u32) -> ObstacleScene {
    let mut scene = ObstacleScene::new();
    let height = side as f32 * CELL * 0.75;
    let mut id = 0;
    for x in (2..side).step_by(4) {
        for y in (2..side).step_by(4) {
            let min = Vec3::new(x as f32 * CELL, y as f32 * CELL, 0.0);
            scene.add_box(
                ActorId(id),
                min,
                min + Vec3::new(CELL, CELL, height),
                CategoryMask::WORLD_STATIC,
            );
            id += 1;
            let crate_min = min + Vec3::new(2.0 * CELL, 0.0, 0.0);
            scene.add_box(
                ActorId(id),
                crate_min,
                crate_min + Vec3::splat(CELL),
                CategoryMask::WORLD_DYNAMIC,
            );
            id += 1;
        }
    }
    scene
}

fn built_volume(side: u32, scene: &ObstacleScene) -> NavVolume {
    let config = VolumeConfig::with_grid((side, side, side), CELL);
    let mut volume = NavVolume::new(config, VolumeTransform::default()).unwrap();
    volume.build(scene).unwrap();
    volume
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for side in [8u32, 16, 32] {
        let scene = pillar_scene(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            b.iter(|| black_box(built_volume(side, &scene)));
        });
    }
    group.finish();
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    let request = PathRequest::new(CategoryMask::WORLD_DYNAMIC);
    for side in [8u32, 16, 32] {
        let scene = pillar_scene(side);
        let volume = built_volume(side, &scene);
        let start = volume.cell_to_world(GridCoord::new(0, 0, 0));
        let last = side as i32 - 1;
        let goal = volume.cell_to_world(GridCoord::new(last, last, 0));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                volume
                    .find_path(&scene, black_box(start), black_box(goal), &request)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_nearest_free(c: &mut Criterion) {
    let side = 16;
    let scene = pillar_scene(side);
    let volume = built_volume(side, &scene);
    let request = PathRequest::new(CategoryMask::WORLD_DYNAMIC);
    // Inside the first pillar.
    let seed = GridCoord::new(2, 2, 0);
    c.bench_function("nearest_free_cell/16", |b| {
        b.iter(|| {
            volume
                .find_nearest_free_cell(&scene, black_box(seed), &request)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_build, bench_find_path, bench_nearest_free);
criterion_main!(benches);
