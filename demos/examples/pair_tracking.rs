// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pair formation and dissolution over a few simulation ticks.
//!
//! Two boxes approach, overlap, and separate; the observer logs every
//! transition and hands out tokens that come back on dissolution.
//!
//! Run:
//! - `cargo run -p thicket_demos --example pair_tracking`

use thicket_broadphase::{BroadPhase, PairEndpoint, PairObserver};
use thicket_bvh::Margin;
use thicket_geom::{Aabb3, Vec3};

struct Log {
    next_token: u32,
    transitions: Vec<String>,
}

impl PairObserver<&'static str> for Log {
    type Token = u32;

    fn on_pair(&mut self, a: PairEndpoint<&'static str>, b: PairEndpoint<&'static str>) -> u32 {
        let token = self.next_token;
        self.next_token += 1;
        self.transitions
            .push(format!("pair {} <-> {} (token {token})", a.payload, b.payload));
        token
    }

    fn on_unpair(&mut self, a: PairEndpoint<&'static str>, b: PairEndpoint<&'static str>, token: u32) {
        self.transitions
            .push(format!("unpair {} <-> {} (token {token})", a.payload, b.payload));
    }
}

fn unit_box(min: Vec3) -> Aabb3 {
    Aabb3::from_min_size(min, Vec3::splat(1.0))
}

fn main() {
    let mut bp = BroadPhase::new(Log {
        next_token: 0,
        transitions: Vec::new(),
    });
    bp.set_pairing_expansion(Margin::Fixed(1.0));

    let _anchor = bp.create("anchor", unit_box(Vec3::ZERO), 0, true, 1, u32::MAX);
    let rover = bp.create("rover", unit_box(Vec3::splat(5.0)), 0, true, 1, u32::MAX);

    println!("== Tick 1: far apart ==");
    bp.update();
    println!("  transitions: {:?}", bp.observer().transitions);
    assert!(bp.observer().transitions.is_empty());

    println!("== Tick 2: rover approaches ==");
    bp.move_item(rover, unit_box(Vec3::splat(1.5)));
    bp.update();
    println!("  transitions: {:?}", bp.observer().transitions);
    assert_eq!(bp.observer().transitions.len(), 1);

    println!("== Tick 3: small wiggle, absorbed by the hysteresis band ==");
    bp.move_item(rover, unit_box(Vec3::splat(1.6)));
    bp.update();
    assert_eq!(bp.observer().transitions.len(), 1);

    println!("== Tick 4: rover departs ==");
    bp.move_item(rover, unit_box(Vec3::splat(5.0)));
    bp.update();
    println!("  transitions: {:?}", bp.observer().transitions);

    let log = bp.into_observer();
    assert_eq!(
        log.transitions,
        vec![
            "pair anchor <-> rover (token 0)",
            "unpair anchor <-> rover (token 0)",
        ]
    );
}
