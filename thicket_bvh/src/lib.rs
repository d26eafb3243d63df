// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket BVH: an incremental 3D bounding-volume hierarchy.
//!
//! This crate stores axis-aligned bounding boxes with user payloads in an
//! incrementally maintained binary AABB tree and answers culling queries
//! against a box, segment, point, or convex hull.
//!
//! - Items are addressed by a generational [`ItemId`]: slots are reused after
//!   removal but stale ids never alias a live item.
//! - Each item carries a payload, a caller-defined subindex, and pairing
//!   attributes (a pairable flag plus type/mask bit sets) that culling
//!   queries can filter on. The pairing layer above this crate uses those
//!   attributes; plain spatial users can ignore them.
//! - Stored leaf volumes are expanded by a configurable [`Margin`] so small
//!   movements do not touch the tree at all; [`Bvh::update`] reports whether
//!   a move was large enough to re-seat the stored volume.
//! - [`Bvh::optimize_incremental`] performs a bounded amount of maintenance
//!   per call, so the tree gradually adapts to motion without rebuild spikes.
//!
//! # Example
//!
//! ```rust
//! use thicket_bvh::{Bvh, CullQuery};
//! use thicket_geom::{Aabb3, Vec3};
//!
//! let mut bvh: Bvh<u32> = Bvh::new();
//! let a = bvh.insert(
//!     Aabb3::new(Vec3::ZERO, Vec3::splat(1.0)),
//!     7,
//!     0,
//!     false,
//!     0,
//!     u32::MAX,
//! );
//!
//! let mut hits = Vec::new();
//! bvh.cull(
//!     &CullQuery::aabb(Aabb3::new(Vec3::splat(0.5), Vec3::splat(2.0))),
//!     &mut hits,
//!     usize::MAX,
//! );
//! assert_eq!(hits, vec![a]);
//! assert_eq!(bvh.payload(a), Some(7));
//! ```

#![no_std]

extern crate alloc;

pub mod cull;
pub mod item;
pub mod tree;

pub use cull::{CullQuery, CullShape};
pub use item::{ItemFlags, ItemId};
pub use tree::{Bvh, Margin};
