// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Planes in normal/distance form.

use crate::vec3::Vec3;

/// A plane described by `normal . p = d`.
///
/// The normal is not normalized by this type; callers that need metric
/// distances must supply unit normals. Sign tests (which side of the plane a
/// point is on) work with any non-zero normal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Plane normal. Points toward the "outside" half-space.
    pub normal: Vec3,
    /// Distance term: `normal . p = d` for points on the plane.
    pub d: f32,
}

impl Plane {
    /// Create a plane from a normal and distance term.
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Create a plane passing through `point` with the given normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            d: normal.dot(point),
        }
    }

    /// Signed distance from the point to the plane.
    ///
    /// Positive values are on the normal's side ("outside").
    #[inline]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.d
    }
}
