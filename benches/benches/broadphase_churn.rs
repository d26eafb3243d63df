// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use thicket_broadphase::{BroadPhase, PairEndpoint, PairObserver};
use thicket_bvh::Margin;
use thicket_geom::{Aabb3, Vec3};

/// Counts transitions; cheap enough that the pairing pass dominates.
#[derive(Default)]
struct Counter {
    pairs: u64,
    unpairs: u64,
}

impl PairObserver<u32> for Counter {
    type Token = ();

    fn on_pair(&mut self, _a: PairEndpoint<u32>, _b: PairEndpoint<u32>) {
        self.pairs += 1;
    }

    fn on_unpair(&mut self, _a: PairEndpoint<u32>, _b: PairEndpoint<u32>, _token: ()) {
        self.unpairs += 1;
    }
}

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

fn random_points(count: usize, world: f32, seed: u64) -> Vec<Vec3> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.next_f32() * world,
                rng.next_f32() * world,
                rng.next_f32() * world,
            )
        })
        .collect()
}

fn populated(
    count: usize,
    world: f32,
) -> (BroadPhase<u32, Counter>, Vec<thicket_bvh::ItemId>, Vec<Vec3>) {
    let mut bp = BroadPhase::new(Counter::default());
    bp.set_pairing_expansion(Margin::Fixed(4.0));
    let points = random_points(count, world, 0xBADC_F00D_1234_5678);
    let ids = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            bp.create(
                i as u32,
                Aabb3::from_min_size(*p, Vec3::splat(12.0)),
                0,
                true,
                1,
                u32::MAX,
            )
        })
        .collect();
    bp.update();
    (bp, ids, points)
}

fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_populate");
    for &count in &[1024usize, 4096] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("create_update_{}", count), |b| {
            b.iter(|| {
                let (bp, _, _) = populated(count, 1000.0);
                black_box(bp.observer().pairs);
            });
        });
    }
    group.finish();
}

fn bench_tick_jitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_tick");
    let (bp, ids, points) = populated(4096, 1000.0);
    group.throughput(Throughput::Elements(ids.len() as u64));
    group.bench_function("jitter_all_then_update", |b| {
        b.iter_batched(
            || (bp_clone(&bp, &points), ids.clone()),
            |(mut bp, ids)| {
                let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
                for (j, id) in ids.iter().enumerate() {
                    // half the moves stay inside the hysteresis band
                    let amp = if j % 2 == 0 { 1.0 } else { 10.0 };
                    let d = Vec3::new(
                        (rng.next_f32() - 0.5) * amp,
                        (rng.next_f32() - 0.5) * amp,
                        (rng.next_f32() - 0.5) * amp,
                    );
                    bp.move_item(*id, Aabb3::from_min_size(points[j] + d, Vec3::splat(12.0)));
                }
                bp.update();
                black_box(bp.observer().pairs + bp.observer().unpairs);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

// BroadPhase holds observer state, so benchmarks rebuild instead of cloning.
fn bp_clone(
    src: &BroadPhase<u32, Counter>,
    points: &[Vec3],
) -> BroadPhase<u32, Counter> {
    let mut bp = BroadPhase::new(Counter::default());
    bp.set_pairing_expansion(Margin::Fixed(4.0));
    for (i, p) in points.iter().enumerate() {
        bp.create(
            i as u32,
            Aabb3::from_min_size(*p, Vec3::splat(12.0)),
            0,
            true,
            1,
            u32::MAX,
        );
    }
    bp.update();
    debug_assert_eq!(bp.len(), src.len());
    bp
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_churn");
    group.bench_function("erase_recreate_quarter", |b| {
        let points = random_points(4096, 1000.0, 0xBADC_F00D_1234_5678);
        b.iter_batched(
            || {
                let (bp, ids, _) = populated(4096, 1000.0);
                (bp, ids)
            },
            |(mut bp, mut ids)| {
                for j in (0..ids.len()).step_by(4) {
                    bp.erase(ids[j]);
                    ids[j] = bp.create(
                        j as u32,
                        Aabb3::from_min_size(points[j], Vec3::splat(12.0)),
                        0,
                        true,
                        1,
                        u32::MAX,
                    );
                }
                bp.update();
                black_box(bp.observer().unpairs);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_populate, bench_tick_jitter, bench_churn);
criterion_main!(benches);
