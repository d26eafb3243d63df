// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The broad-phase manager: public operation surface and the pairing pass.

use alloc::vec::Vec;
use core::fmt::Debug;

use thicket_bvh::{Bvh, CullQuery, CullShape, ItemId, Margin};
use thicket_geom::{Aabb3, Plane, Vec3, convex_hull_points};

use crate::observer::{PairEndpoint, PairObserver};
use crate::pairs::PairList;
use crate::tracker::ChangeTracker;

/// Incremental broad-phase pair tracking over a [`Bvh`].
///
/// Owns the spatial index, the per-item relation lists, the change tracker,
/// and the observer. See the [crate docs](crate) for the overall model.
///
/// ## Caller obligations
///
/// - Handles passed in must come from this instance's [`create`](Self::create);
///   stale handles are ignored, foreign ones may alias arbitrary items.
/// - [`update`](Self::update) is meant to run once per simulation tick.
/// - No internal synchronization: wrap the whole value in a lock for
///   multi-threaded use.
pub struct BroadPhase<P: Copy + Debug, O: PairObserver<P>> {
    tree: Bvh<P>,
    /// Relation lists per item slot, kept in lockstep with the tree's slots.
    pairs: Vec<PairList<O::Token>>,
    tracker: ChangeTracker,
    pairing_expansion: Margin,
    observer: O,
}

impl<P: Copy + Debug, O: PairObserver<P>> Debug for BroadPhase<P, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadPhase")
            .field("tree", &self.tree)
            .field("pending", &self.tracker.pending())
            .field("tick", &self.tracker.current_tick())
            .field("pairing_expansion", &self.pairing_expansion)
            .finish_non_exhaustive()
    }
}

impl<P: Copy + Debug, O: PairObserver<P>> BroadPhase<P, O> {
    /// Create an empty broad phase delivering notifications to `observer`.
    pub fn new(observer: O) -> Self {
        Self {
            tree: Bvh::new(),
            pairs: Vec::new(),
            tracker: ChangeTracker::new(),
            pairing_expansion: Margin::Auto,
            observer,
        }
    }

    /// Borrow the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutably borrow the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the broad phase, returning the observer.
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Set the tree's leaf expansion margin.
    ///
    /// Controls only how often moves re-seat tree leaves; pair transitions
    /// never depend on it, because every move is also tested against the
    /// pairing band (see
    /// [`set_pairing_expansion`](Self::set_pairing_expansion)). Values wider
    /// than the pairing expansion reduce tree churn at the cost of looser
    /// stored volumes.
    pub fn set_node_expansion(&mut self, margin: Margin) {
        self.tree.set_node_expansion(margin);
    }

    /// Set the pairing expansion margin (the hysteresis band width).
    ///
    /// The band alone decides when a move re-examines the item's relations;
    /// it is independent of the leaf margin set by
    /// [`set_node_expansion`](Self::set_node_expansion).
    pub fn set_pairing_expansion(&mut self, margin: Margin) {
        self.pairing_expansion = margin;
    }

    fn pairing_margin(&self) -> f32 {
        self.pairing_expansion.resolve(self.tree.heuristic_margin())
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the broad phase holds no items.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert a new item and queue it for pairing on the next update.
    pub fn create(
        &mut self,
        payload: P,
        aabb: Aabb3,
        subindex: i32,
        pairable: bool,
        pairable_type: u32,
        pairable_mask: u32,
    ) -> ItemId {
        let id = self
            .tree
            .insert(aabb, payload, subindex, pairable, pairable_type, pairable_mask);
        self.ensure_slot(id.index());
        let margin = self.pairing_margin();
        self.tracker.mark_changed(id, &aabb, margin);
        id
    }

    /// Move an item.
    ///
    /// The tree re-seats the leaf only when the move escapes the leaf
    /// expansion margin. The pairing band is tested on every move,
    /// independently of the leaf margin: movement inside the band costs one
    /// containment test, movement beyond it queues the item for
    /// re-examination on the next update.
    pub fn move_item(&mut self, id: ItemId, aabb: Aabb3) {
        if !self.tree.is_alive(id) {
            return;
        }
        self.tree.update(id, aabb);
        let margin = self.pairing_margin();
        self.tracker.mark_changed(id, &aabb, margin);
    }

    /// Remove an item, dissolving all of its relations first.
    ///
    /// Fires one unpair notification per surviving partner, scrubs the item
    /// from the change queue, and only then releases the slot, so an id
    /// recycled by a later [`create`](Self::create) never inherits stale
    /// relation state.
    pub fn erase(&mut self, id: ItemId) {
        if !self.tree.is_alive(id) {
            return;
        }
        self.unpair_all(id);
        self.tracker.unmark(id);
        self.tree.remove(id);
    }

    /// Change an item's pairing attributes.
    ///
    /// Existing relations are not retroactively dissolved when they no longer
    /// satisfy the new type/mask; they dissolve when the geometry next
    /// separates or an endpoint is erased. The item is queued for
    /// re-examination so relations newly allowed by the attributes form on
    /// the next update.
    pub fn set_pairable(&mut self, id: ItemId, pairable: bool, pairable_type: u32, mask: u32) {
        self.tree.set_pairable(id, pairable, pairable_type, mask);
        if let Some(aabb) = self.tree.aabb(id) {
            let margin = self.pairing_margin();
            self.tracker.force_mark(id, &aabb, margin);
        }
    }

    /// The item's current (unexpanded) box.
    pub fn get_aabb(&self, id: ItemId) -> Option<Aabb3> {
        self.tree.aabb(id)
    }

    /// The item's payload.
    pub fn payload(&self, id: ItemId) -> Option<P> {
        self.tree.payload(id)
    }

    /// The item's subindex.
    pub fn subindex(&self, id: ItemId) -> Option<i32> {
        self.tree.subindex(id)
    }

    /// Whether the item is pairable.
    pub fn is_pairable(&self, id: ItemId) -> bool {
        self.tree.is_pairable(id)
    }

    /// Whether a relation between `a` and `b` currently exists.
    pub fn is_paired(&self, a: ItemId, b: ItemId) -> bool {
        self.tree.is_alive(a)
            && self
                .pairs
                .get(a.index())
                .is_some_and(|list| list.contains(b))
    }

    /// Number of relations currently recorded against the item.
    pub fn pair_count(&self, id: ItemId) -> usize {
        if !self.tree.is_alive(id) {
            return 0;
        }
        self.pairs.get(id.index()).map_or(0, PairList::len)
    }

    /// Collect payloads of items intersecting `aabb`, up to `max`.
    ///
    /// Fills `results` (and `subindices` when given, in lockstep) and returns
    /// the number of matches written. Matches beyond `max` are silently
    /// dropped.
    pub fn cull_box(
        &self,
        aabb: Aabb3,
        results: &mut Vec<P>,
        max: usize,
        subindices: Option<&mut Vec<i32>>,
        mask: u32,
    ) -> usize {
        self.cull_shape(CullShape::Aabb(aabb), results, max, subindices, mask)
    }

    /// Collect payloads of items crossed by the segment, up to `max`.
    pub fn cull_segment(
        &self,
        from: Vec3,
        to: Vec3,
        results: &mut Vec<P>,
        max: usize,
        subindices: Option<&mut Vec<i32>>,
        mask: u32,
    ) -> usize {
        self.cull_shape(CullShape::Segment { from, to }, results, max, subindices, mask)
    }

    /// Collect payloads of items containing the point, up to `max`.
    pub fn cull_point(
        &self,
        point: Vec3,
        results: &mut Vec<P>,
        max: usize,
        subindices: Option<&mut Vec<i32>>,
        mask: u32,
    ) -> usize {
        self.cull_shape(CullShape::Point(point), results, max, subindices, mask)
    }

    /// Collect payloads of items intersecting the convex region, up to `max`.
    ///
    /// Corner points are derived from the planes; a plane set that does not
    /// close off a region yields zero matches.
    pub fn cull_hull(
        &self,
        planes: &[Plane],
        results: &mut Vec<P>,
        max: usize,
        mask: u32,
    ) -> usize {
        if planes.is_empty() {
            return 0;
        }
        let points = convex_hull_points(planes);
        if points.is_empty() {
            return 0;
        }
        self.cull_shape(
            CullShape::Hull {
                planes,
                points: &points,
            },
            results,
            max,
            None,
            mask,
        )
    }

    fn cull_shape(
        &self,
        shape: CullShape<'_>,
        results: &mut Vec<P>,
        max: usize,
        mut subindices: Option<&mut Vec<i32>>,
        mask: u32,
    ) -> usize {
        let query = CullQuery::from_shape(shape).with_mask(mask);
        let mut ids = Vec::new();
        self.tree.cull(&query, &mut ids, max);
        for id in &ids {
            results.push(self.tree.payload(*id).expect("cull result must be live"));
            if let Some(subs) = subindices.as_mut() {
                subs.push(self.tree.subindex(*id).expect("cull result must be live"));
            }
        }
        ids.len()
    }

    /// Run one tick: tree maintenance, then the pairing pass, then queue
    /// reset and tick advance.
    ///
    /// Processes the change queue as snapshotted at entry; items queued as a
    /// side effect of this pass wait for the next tick, so per-tick work is
    /// bounded by the queue size at entry. Pair/unpair notifications fire
    /// inline, leavers before enterers per item. Debug builds verify tree
    /// integrity afterwards.
    pub fn update(&mut self) {
        self.tree.optimize_incremental();
        self.check_for_collisions();
        self.tracker.advance_tick();
        #[cfg(debug_assertions)]
        self.tree.integrity_check();
    }

    //
    // the pairing pass
    //

    fn check_for_collisions(&mut self) {
        let snapshot = self.tracker.snapshot();
        for h in snapshot {
            debug_assert!(self.tree.is_alive(h), "queued item must be live");
            let Some(expanded) = self.tracker.expanded(h.index()) else {
                continue;
            };

            self.find_leavers(h, &expanded);

            let Some(mask) = self.tree.pairable_mask(h) else {
                continue;
            };
            let mut query = CullQuery::aabb(expanded);
            query.mask = mask;
            query.pairable_type = self.tree.pairable_type(h).unwrap_or(0);
            // two non-pairable items never pair, so a non-pairable mover
            // only needs to look at pairable candidates
            query.pairable_only = !self.tree.is_pairable(h);

            let mut hits = Vec::new();
            self.tree.cull(&query, &mut hits, usize::MAX);
            for c in hits {
                if c == h {
                    continue;
                }
                debug_assert!(
                    !query.pairable_only || self.tree.is_pairable(c),
                    "pairable-only cull must not return non-pairable items"
                );
                self.collide(h, c);
            }
        }
    }

    /// Dissolve every relation of `h` whose partner no longer overlaps the
    /// expanded box.
    fn find_leavers(&mut self, h: ItemId, expanded: &Aabb3) {
        let mut n = 0;
        while let Some(partner) = self.pairs[h.index()].partner_at(n) {
            let overlaps = self
                .tree
                .aabb(partner)
                .is_some_and(|aabb| expanded.intersects(&aabb));
            if overlaps {
                n += 1;
            } else {
                // swap-remove puts a fresh entry at n; re-test the same index
                self.unpair(h, partner);
            }
        }
    }

    /// Record and announce a new pair unless it already exists.
    fn collide(&mut self, ha: ItemId, hb: ItemId) {
        let (a, b) = canonical(ha, hb);
        // membership test on whichever side has the smaller degree
        let exists = if self.pairs[a.index()].len() <= self.pairs[b.index()].len() {
            self.pairs[a.index()].contains(b)
        } else {
            self.pairs[b.index()].contains(a)
        };
        if exists {
            return;
        }
        let ea = self.endpoint(a);
        let eb = self.endpoint(b);
        let token = self.observer.on_pair(ea, eb);
        self.pairs[a.index()].add(b, token);
        self.pairs[b.index()].add(a, token);
    }

    /// Remove a relation from both sides and announce its dissolution.
    fn unpair(&mut self, ha: ItemId, hb: ItemId) {
        let (a, b) = canonical(ha, hb);
        let token = self.pairs[a.index()].remove(b);
        let mirrored = self.pairs[b.index()].remove(a);
        debug_assert!(
            token.is_some() && mirrored.is_some(),
            "pair storage must be symmetric"
        );
        let Some(token) = token else {
            return;
        };
        let ea = self.endpoint(a);
        let eb = self.endpoint(b);
        self.observer.on_unpair(ea, eb, token);
    }

    fn unpair_all(&mut self, h: ItemId) {
        while let Some(partner) = self.pairs[h.index()].first_partner() {
            self.unpair(h, partner);
        }
    }

    fn endpoint(&self, id: ItemId) -> PairEndpoint<P> {
        PairEndpoint {
            id,
            payload: self.tree.payload(id).expect("pair endpoint must be live"),
            subindex: self.tree.subindex(id).expect("pair endpoint must be live"),
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        self.tracker.ensure_slot(slot);
        if self.pairs.len() <= slot {
            self.pairs.resize_with(slot + 1, PairList::new);
        }
    }
}

/// Order a pair of handles canonically: lower id first.
#[inline]
fn canonical(a: ItemId, b: ItemId) -> (ItemId, ItemId) {
    if a <= b { (a, b) } else { (b, a) }
}
