// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounding boxes and conservative intersection tests.

use crate::plane::Plane;
use crate::vec3::Vec3;

/// Axis-aligned bounding box in 3D, stored as min/max corners.
///
/// Containment and overlap tests use closed intervals: boxes that merely touch
/// on a face are considered intersecting. Broad-phase pairing relies on this
/// so hysteresis boundaries behave consistently on both sides.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// A zero-size box at the origin.
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    /// Create an AABB from min/max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from a minimum corner and a size.
    pub fn from_min_size(min: Vec3, size: Vec3) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// The smallest AABB containing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Whether the two boxes overlap (closed intervals; touching counts).
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The overlapping region, or `None` when the boxes are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Whether `other` lies entirely within this box (closed intervals).
    #[inline]
    pub fn encloses(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    /// Whether the point lies inside the box (closed intervals).
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    /// Grow the box by `margin` on every side. Negative margins shrink.
    #[inline]
    pub fn grow(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Whether any extent is inverted (max below min on some axis). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Size per axis. Negative when inverted.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the longest axis, clamped to zero.
    pub fn longest_axis_size(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z).max(0.0)
    }

    /// Surface area, accumulated in `f64` to keep split metrics stable.
    pub fn surface_area(&self) -> f64 {
        let s = self.size();
        let (x, y, z) = (
            f64::from(s.x.max(0.0)),
            f64::from(s.y.max(0.0)),
            f64::from(s.z.max(0.0)),
        );
        2.0 * (x * y + y * z + z * x)
    }

    /// Whether the segment from `from` to `to` passes through the box.
    ///
    /// Standard slab test. Degenerate segments reduce to a point test.
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;
        for axis in 0..3 {
            let d = dir.axis(axis);
            let start = from.axis(axis);
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if d == 0.0 {
                // parallel to the slab: inside or miss entirely
                if start < lo || start > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - start) * inv;
            let mut t1 = (hi - start) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    /// The corner of the box furthest in the direction opposite to `dir`
    /// (the support point toward the negative half-space of a plane with
    /// normal `dir`).
    #[inline]
    fn support_negative(&self, dir: Vec3) -> Vec3 {
        Vec3::new(
            if dir.x > 0.0 { self.min.x } else { self.max.x },
            if dir.y > 0.0 { self.min.y } else { self.max.y },
            if dir.z > 0.0 { self.min.z } else { self.max.z },
        )
    }

    /// Whether the box is entirely on the outer side of the plane.
    #[inline]
    pub fn is_outside_plane(&self, plane: &Plane) -> bool {
        plane.distance_to(self.support_negative(plane.normal)) > 0.0
    }

    /// Conservative box-vs-convex-region test.
    ///
    /// `planes` describe the region with outward-facing normals; `points` are
    /// the region's corner points (see
    /// [`convex_hull_points`](crate::convex_hull_points)). The planes-only
    /// test accepts some boxes that are outside the hull but inside every
    /// half-space extension; checking the hull points against the box faces
    /// removes those false positives.
    pub fn intersects_hull(&self, planes: &[Plane], points: &[Vec3]) -> bool {
        for plane in planes {
            if self.is_outside_plane(plane) {
                return false;
            }
        }
        // all points beyond one box face means no overlap
        for axis in 0..3 {
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if points.iter().all(|p| p.axis(axis) < lo) {
                return false;
            }
            if points.iter().all(|p| p.axis(axis) > hi) {
                return false;
            }
        }
        true
    }
}
