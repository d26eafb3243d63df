// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Corner point extraction for convex regions described by planes.

use alloc::vec::Vec;

use crate::plane::Plane;
use crate::vec3::Vec3;

const EPSILON: f32 = 1e-4;

#[inline]
fn abs(v: f32) -> f32 {
    v.max(-v)
}

/// Compute the corner points of the convex region bounded by `planes`.
///
/// Normals must face outward. Every triple of planes is intersected and the
/// resulting point kept when it lies inside (or within epsilon of) all
/// planes. Near-duplicate points are merged.
///
/// Returns an empty list when fewer than three planes are given, when the
/// planes do not close off a region (an unbounded hull has corner points
/// missing on the open side), or when no triple meets at a point. Callers
/// should treat an empty result as "nothing to cull".
pub fn convex_hull_points(planes: &[Plane]) -> Vec<Vec3> {
    let mut points = Vec::new();
    if planes.len() < 3 {
        return points;
    }

    for i in 0..planes.len() {
        for j in (i + 1)..planes.len() {
            for k in (j + 1)..planes.len() {
                let Some(p) = intersect_three(&planes[i], &planes[j], &planes[k]) else {
                    continue;
                };
                if planes.iter().any(|pl| pl.distance_to(p) > EPSILON) {
                    continue;
                }
                let near_dup = points.iter().any(|q: &Vec3| {
                    let d = p - *q;
                    abs(d.x) <= EPSILON && abs(d.y) <= EPSILON && abs(d.z) <= EPSILON
                });
                if !near_dup {
                    points.push(p);
                }
            }
        }
    }
    points
}

/// Intersection point of three planes, or `None` when any two are parallel.
fn intersect_three(a: &Plane, b: &Plane, c: &Plane) -> Option<Vec3> {
    let bc = b.normal.cross(c.normal);
    let det = a.normal.dot(bc);
    if abs(det) < EPSILON {
        return None;
    }
    let ca = c.normal.cross(a.normal);
    let ab = a.normal.cross(b.normal);
    Some((bc * a.d + ca * b.d + ab * c.d) / det)
}
