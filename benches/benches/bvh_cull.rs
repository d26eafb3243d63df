// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use thicket_bvh::{Bvh, CullQuery, Margin};
use thicket_geom::{Aabb3, Vec3};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

fn gen_grid_boxes(n: usize, cell: f32) -> Vec<Aabb3> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Vec3::new(x as f32 * cell, y as f32 * cell, z as f32 * cell);
                out.push(Aabb3::from_min_size(min, Vec3::splat(cell)));
            }
        }
    }
    out
}

fn gen_random_boxes(count: usize, world: f32, size: f32) -> Vec<Aabb3> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let min = Vec3::new(
            rng.next_f32() * world,
            rng.next_f32() * world,
            rng.next_f32() * world,
        );
        out.push(Aabb3::from_min_size(min, Vec3::splat(size)));
    }
    out
}

fn gen_clustered_boxes(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<Aabb3> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push(Vec3::new(
            rng.next_f32() * 2000.0,
            rng.next_f32() * 2000.0,
            rng.next_f32() * 2000.0,
        ));
    }
    for c in centers {
        for _ in 0..per_cluster {
            let d = Vec3::new(
                (rng.next_f32() - 0.5) * spread,
                (rng.next_f32() - 0.5) * spread,
                (rng.next_f32() - 0.5) * spread,
            );
            out.push(Aabb3::from_min_size(c + d, Vec3::splat(12.0)));
        }
    }
    out
}

fn build(boxes: &[Aabb3]) -> Bvh<u32> {
    let mut bvh = Bvh::new();
    for (i, bb) in boxes.iter().enumerate() {
        bvh.insert(*bb, i as u32, 0, false, 0, u32::MAX);
    }
    bvh
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_insert");
    for &n in &[8usize, 16, 24] {
        let boxes = gen_grid_boxes(n, 10.0);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter(|| black_box(build(&boxes)));
        });
    }
    let boxes = gen_random_boxes(8192, 2000.0, 12.0);
    group.bench_function("random_8192", |b| {
        b.iter(|| black_box(build(&boxes)));
    });
    group.finish();
}

fn bench_cull_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_cull_box");
    for &n in &[8usize, 16, 24] {
        let bvh = build(&gen_grid_boxes(n, 10.0));
        group.bench_function(format!("grid_n{}", n), |b| {
            let query = CullQuery::aabb(Aabb3::new(Vec3::splat(20.0), Vec3::splat(80.0)));
            b.iter_batched(
                Vec::new,
                |mut out| {
                    bvh.cull(&query, &mut out, usize::MAX);
                    black_box(out.len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let bvh = build(&gen_clustered_boxes(16, 256, 128.0));
    group.bench_function("clustered_4096", |b| {
        let query = CullQuery::aabb(Aabb3::new(Vec3::splat(800.0), Vec3::splat(1200.0)));
        b.iter_batched(
            Vec::new,
            |mut out| {
                bvh.cull(&query, &mut out, usize::MAX);
                black_box(out.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_cull_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_cull_segment");
    let bvh = build(&gen_grid_boxes(16, 10.0));
    group.bench_function("grid_n16_diagonal", |b| {
        let query = CullQuery::segment(Vec3::ZERO, Vec3::splat(160.0));
        b.iter_batched(
            Vec::new,
            |mut out| {
                bvh.cull(&query, &mut out, usize::MAX);
                black_box(out.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_update");
    let boxes = gen_random_boxes(4096, 2000.0, 12.0);
    group.throughput(Throughput::Elements(4096));
    group.bench_function("wiggle_inside_margin", |b| {
        b.iter_batched(
            || {
                let mut bvh = Bvh::new();
                bvh.set_node_expansion(Margin::Fixed(4.0));
                let ids: Vec<_> = boxes
                    .iter()
                    .enumerate()
                    .map(|(i, bb)| bvh.insert(*bb, i as u32, 0, false, 0, u32::MAX))
                    .collect();
                (bvh, ids)
            },
            |(mut bvh, ids)| {
                for (j, id) in ids.iter().enumerate() {
                    let d = (j % 5) as f32 * 0.5 - 1.0;
                    let bb = boxes[j];
                    bvh.update(*id, Aabb3::new(bb.min + Vec3::splat(d), bb.max + Vec3::splat(d)));
                }
                black_box(bvh.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("teleport_every_item", |b| {
        b.iter_batched(
            || {
                let mut bvh = Bvh::new();
                bvh.set_node_expansion(Margin::Fixed(4.0));
                let ids: Vec<_> = boxes
                    .iter()
                    .enumerate()
                    .map(|(i, bb)| bvh.insert(*bb, i as u32, 0, false, 0, u32::MAX))
                    .collect();
                (bvh, ids)
            },
            |(mut bvh, ids)| {
                for (j, id) in ids.iter().enumerate() {
                    let far = Vec3::splat(3000.0 + j as f32);
                    bvh.update(*id, Aabb3::from_min_size(far, Vec3::splat(12.0)));
                }
                black_box(bvh.len());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_cull_box,
    bench_cull_segment,
    bench_update,
);
criterion_main!(benches);
