// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Geom: a minimal 3D geometry kit for spatial indexing.
//!
//! This crate provides the small set of primitives the rest of the workspace
//! builds on:
//!
//! - [`Vec3`]: a plain `f32` 3-vector with the usual componentwise operations.
//! - [`Aabb3`]: an axis-aligned bounding box with union/intersection/containment,
//!   margin growth, and conservative segment and convex-hull intersection tests.
//! - [`Plane`]: a plane in normal/distance form.
//! - [`convex_hull_points`]: extracts the corner points of a convex region
//!   described by a set of outward-facing planes, used to set up hull culling
//!   queries against an AABB tree.
//!
//! It is deliberately not a general-purpose math library. Everything here is
//! sized for broad-phase work: conservative tests that may report an
//! intersection slightly too eagerly are fine, missing one is not.
//!
//! # Example
//!
//! ```rust
//! use thicket_geom::{Aabb3, Vec3};
//!
//! let a = Aabb3::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
//! let b = Aabb3::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.0, 2.0, 2.0));
//! assert!(a.intersects(&b));
//! assert!(a.grow(1.0).encloses(&b));
//! ```
//!
//! ## Float semantics
//!
//! This crate assumes no NaNs in coordinates. Debug builds may assert.

#![no_std]

extern crate alloc;

pub mod aabb;
pub mod convex;
pub mod plane;
pub mod vec3;

pub use aabb::Aabb3;
pub use convex::convex_hull_points;
pub use plane::Plane;
pub use vec3::Vec3;
