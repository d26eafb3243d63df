// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Broadphase: incremental pair tracking over a BVH.
//!
//! This crate maintains the set of currently overlapping item pairs for a
//! dynamic set of AABBs and notifies an observer exactly once when a pair
//! forms and exactly once when it dissolves. It is a broad phase: it reports
//! *that* two items' expanded volumes overlap, nothing more.
//!
//! ## How it works
//!
//! - Every item carries an expanded AABB (its box grown by the pairing
//!   margin) acting as a hysteresis band: movement inside the band is
//!   absorbed, movement beyond it enqueues the item for re-examination.
//! - Once per tick, [`BroadPhase::update`] processes the queue: for each
//!   changed item it first dissolves relations whose partners no longer
//!   overlap the expanded box (leavers), then queries the BVH for newly
//!   overlapping candidates (enterers) and forms relations for them.
//! - Relations are stored symmetrically on both endpoints together with the
//!   opaque token the observer returned at formation; the same token is
//!   handed back at dissolution.
//!
//! ## Observer
//!
//! Pair and unpair notifications are delivered synchronously through the
//! [`PairObserver`] trait. The observer is owned by the [`BroadPhase`], so a
//! handler cannot re-enter the broad phase from within a notification; that
//! restriction is structural, not merely documented.
//!
//! ## Example
//!
//! ```rust
//! use thicket_broadphase::{BroadPhase, PairEndpoint, PairObserver};
//! use thicket_bvh::Margin;
//! use thicket_geom::{Aabb3, Vec3};
//!
//! struct Log(Vec<&'static str>);
//!
//! impl PairObserver<u32> for Log {
//!     type Token = u32;
//!     fn on_pair(&mut self, a: PairEndpoint<u32>, b: PairEndpoint<u32>) -> u32 {
//!         self.0.push("pair");
//!         a.payload + b.payload
//!     }
//!     fn on_unpair(&mut self, _a: PairEndpoint<u32>, _b: PairEndpoint<u32>, token: u32) {
//!         assert_eq!(token, 3);
//!         self.0.push("unpair");
//!     }
//! }
//!
//! let mut bp = BroadPhase::new(Log(Vec::new()));
//! bp.set_pairing_expansion(Margin::Fixed(1.0));
//!
//! let unit = Vec3::splat(1.0);
//! let a = bp.create(1, Aabb3::from_min_size(Vec3::ZERO, unit), 0, true, 1, u32::MAX);
//! let b = bp.create(2, Aabb3::from_min_size(Vec3::splat(5.0), unit), 0, true, 1, u32::MAX);
//! bp.update();
//! assert!(bp.observer().0.is_empty()); // too far apart
//!
//! bp.move_item(b, Aabb3::from_min_size(Vec3::splat(1.5), unit));
//! bp.update();
//! assert_eq!(bp.observer().0, ["pair"]);
//!
//! bp.move_item(b, Aabb3::from_min_size(Vec3::splat(5.0), unit));
//! bp.update();
//! assert_eq!(bp.observer().0, ["pair", "unpair"]);
//! # let _ = a;
//! ```
//!
//! ## Threading
//!
//! Single-threaded by design: no internal locks, notifications run inline on
//! the calling thread. Wrap the whole [`BroadPhase`] in external
//! synchronization if several threads need it.

#![no_std]

extern crate alloc;

pub mod broadphase;
pub mod observer;
pub mod pairs;
pub mod tracker;

pub use broadphase::BroadPhase;
pub use observer::{PairEndpoint, PairObserver};
pub use pairs::PairList;
pub use tracker::ChangeTracker;
