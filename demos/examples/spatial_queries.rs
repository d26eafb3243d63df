// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial queries through the broad-phase facade.
//!
//! Populates a small scene and runs box, segment, point, and convex-region
//! culls, with and without a mask.
//!
//! Run:
//! - `cargo run -p thicket_demos --example spatial_queries`

use thicket_broadphase::{BroadPhase, PairEndpoint, PairObserver};
use thicket_geom::{Aabb3, Plane, Vec3};

/// No pair tracking in this demo; the observer is never called.
struct Quiet;

impl PairObserver<u32> for Quiet {
    type Token = ();
    fn on_pair(&mut self, _a: PairEndpoint<u32>, _b: PairEndpoint<u32>) {}
    fn on_unpair(&mut self, _a: PairEndpoint<u32>, _b: PairEndpoint<u32>, _token: ()) {}
}

const TYPE_PROP: u32 = 0b01;
const TYPE_TRIGGER: u32 = 0b10;

fn main() {
    let mut bp = BroadPhase::new(Quiet);

    // a row of unit boxes along x, alternating types
    for i in 0..8_u32 {
        let ty = if i % 2 == 0 { TYPE_PROP } else { TYPE_TRIGGER };
        bp.create(
            i,
            Aabb3::from_min_size(Vec3::new(i as f32 * 3.0, 0.0, 0.0), Vec3::splat(1.0)),
            0,
            false,
            ty,
            0,
        );
    }
    bp.update();

    println!("== Box query over the first half ==");
    let mut hits = Vec::new();
    let region = Aabb3::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(10.0, 2.0, 2.0));
    bp.cull_box(region, &mut hits, usize::MAX, None, u32::MAX);
    hits.sort_unstable();
    println!("  payloads: {hits:?}");
    assert_eq!(hits, vec![0, 1, 2, 3]);

    println!("== Same box, triggers only ==");
    let mut triggers = Vec::new();
    bp.cull_box(region, &mut triggers, usize::MAX, None, TYPE_TRIGGER);
    triggers.sort_unstable();
    println!("  payloads: {triggers:?}");
    assert_eq!(triggers, vec![1, 3]);

    println!("== Ray along the row ==");
    let mut along = Vec::new();
    bp.cull_segment(
        Vec3::new(-5.0, 0.5, 0.5),
        Vec3::new(100.0, 0.5, 0.5),
        &mut along,
        usize::MAX,
        None,
        u32::MAX,
    );
    println!("  {} items crossed", along.len());
    assert_eq!(along.len(), 8);

    println!("== Point probe inside item 2 ==");
    let mut at_point = Vec::new();
    bp.cull_point(Vec3::new(6.5, 0.5, 0.5), &mut at_point, usize::MAX, None, u32::MAX);
    println!("  payloads: {at_point:?}");
    assert_eq!(at_point, vec![2]);

    println!("== Convex region around items 0 and 1 ==");
    // a box from (-1,-1,-1) to (5,2,2) expressed as six outward planes
    let planes = [
        Plane::new(Vec3::new(1.0, 0.0, 0.0), 5.0),
        Plane::new(Vec3::new(-1.0, 0.0, 0.0), 1.0),
        Plane::new(Vec3::new(0.0, 1.0, 0.0), 2.0),
        Plane::new(Vec3::new(0.0, -1.0, 0.0), 1.0),
        Plane::new(Vec3::new(0.0, 0.0, 1.0), 2.0),
        Plane::new(Vec3::new(0.0, 0.0, -1.0), 1.0),
    ];
    let mut in_hull = Vec::new();
    bp.cull_hull(&planes, &mut in_hull, usize::MAX, u32::MAX);
    in_hull.sort_unstable();
    println!("  payloads: {in_hull:?}");
    assert_eq!(in_hull, vec![0, 1]);
}
