// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Culling query descriptions: shape plus pairing filters.

use thicket_geom::{Aabb3, Plane, Vec3};

/// The geometric shape a cull query tests against.
#[derive(Copy, Clone, Debug)]
pub enum CullShape<'a> {
    /// Everything intersecting the box.
    Aabb(Aabb3),
    /// Everything crossed by the segment.
    Segment {
        /// Segment start.
        from: Vec3,
        /// Segment end.
        to: Vec3,
    },
    /// Everything containing the point.
    Point(Vec3),
    /// Everything intersecting the convex region.
    ///
    /// `points` are the region's corners as produced by
    /// [`thicket_geom::convex_hull_points`]; they tighten the planes-only
    /// test. An empty plane list matches nothing.
    Hull {
        /// Outward-facing bounding planes.
        planes: &'a [Plane],
        /// Corner points of the region.
        points: &'a [Vec3],
    },
}

impl CullShape<'_> {
    /// Conservative test of this shape against an AABB.
    #[inline]
    pub fn hits_aabb(&self, aabb: &Aabb3) -> bool {
        match self {
            Self::Aabb(b) => aabb.intersects(b),
            Self::Segment { from, to } => aabb.intersects_segment(*from, *to),
            Self::Point(p) => aabb.contains_point(*p),
            Self::Hull { planes, points } => {
                !planes.is_empty() && aabb.intersects_hull(planes, points)
            }
        }
    }
}

/// A culling query: a [`CullShape`] plus pairing filters.
///
/// ## Mask semantics
///
/// An item passes the filter when any of these holds:
///
/// - `mask` is [`u32::MAX`] (the match-all sentinel, also matching items with
///   an empty `pairable_type`),
/// - `mask` intersects the item's `pairable_type`, or
/// - the item's `pairable_mask` intersects this query's `pairable_type`.
///
/// The last arm makes item-initiated queries symmetric: the pairing layer
/// fills `mask`/`pairable_type` from the querying item so that either side's
/// mask may establish interest. Plain spatial queries leave `pairable_type`
/// at zero and get one-way filtering.
#[derive(Copy, Clone, Debug)]
pub struct CullQuery<'a> {
    /// The shape to test against.
    pub shape: CullShape<'a>,
    /// Bit set tested against candidate items' `pairable_type`.
    pub mask: u32,
    /// The querying item's own type bits (zero for plain queries).
    pub pairable_type: u32,
    /// Skip items that are not pairable.
    pub pairable_only: bool,
}

impl<'a> CullQuery<'a> {
    /// Query everything intersecting `aabb`, with the match-all mask.
    pub const fn aabb(aabb: Aabb3) -> Self {
        Self::from_shape(CullShape::Aabb(aabb))
    }

    /// Query everything crossed by the segment, with the match-all mask.
    pub const fn segment(from: Vec3, to: Vec3) -> Self {
        Self::from_shape(CullShape::Segment { from, to })
    }

    /// Query everything containing the point, with the match-all mask.
    pub const fn point(p: Vec3) -> Self {
        Self::from_shape(CullShape::Point(p))
    }

    /// Query everything intersecting the convex region, with the match-all mask.
    pub const fn hull(planes: &'a [Plane], points: &'a [Vec3]) -> Self {
        Self::from_shape(CullShape::Hull { planes, points })
    }

    /// Query the given shape with the match-all mask and no pairing filters.
    pub const fn from_shape(shape: CullShape<'a>) -> Self {
        Self {
            shape,
            mask: u32::MAX,
            pairable_type: 0,
            pairable_only: false,
        }
    }

    /// Replace the mask.
    pub const fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Whether an item with the given pairing attributes passes the filter.
    #[inline]
    pub fn mask_hit(&self, item_type: u32, item_mask: u32) -> bool {
        self.mask == u32::MAX
            || (self.mask & item_type) != 0
            || (item_mask & self.pairable_type) != 0
    }
}
