// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hysteresis change tracking: expanded boxes, tick stamps, the change queue.

use alloc::vec::Vec;

use thicket_bvh::ItemId;
use thicket_geom::Aabb3;

/// Tracks which items need re-examination by the pairing pass.
///
/// Per item slot this keeps the cached expanded AABB (the hysteresis band)
/// and the tick the item was last enqueued on. The queue itself is an
/// unordered list of handles, deduplicated by comparing tick stamps rather
/// than searching the queue.
///
/// The tick counter starts at 1; a stamp of 0 means "never enqueued", so
/// freshly created and freshly recycled slots always pass the dedup check.
#[derive(Clone, Debug, Default)]
pub struct ChangeTracker {
    expanded: Vec<Option<Aabb3>>,
    stamps: Vec<u32>,
    queue: Vec<ItemId>,
    tick: u32,
}

impl ChangeTracker {
    /// Create an empty tracker, at tick 1.
    pub fn new() -> Self {
        Self {
            expanded: Vec::new(),
            stamps: Vec::new(),
            queue: Vec::new(),
            tick: 1,
        }
    }

    /// The current tick.
    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    /// Number of items awaiting re-examination.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Make room for `slot`; new slots start unstamped with no expanded box.
    pub fn ensure_slot(&mut self, slot: usize) {
        if self.expanded.len() <= slot {
            self.expanded.resize(slot + 1, None);
            self.stamps.resize(slot + 1, 0);
        }
    }

    /// The item's cached expanded box, if it has one.
    pub fn expanded(&self, slot: usize) -> Option<Aabb3> {
        self.expanded.get(slot).copied().flatten()
    }

    /// Record that the item moved to `aabb`.
    ///
    /// Absorbed entirely when the cached expanded box still encloses the new
    /// box. Otherwise the expanded box is recomputed with `margin` and the
    /// item is enqueued, unless its stamp shows it is already queued this
    /// tick.
    pub fn mark_changed(&mut self, id: ItemId, aabb: &Aabb3, margin: f32) {
        if let Some(expanded) = self.expanded(id.index())
            && expanded.encloses(aabb)
        {
            return;
        }
        self.force_mark(id, aabb, margin);
    }

    /// Like [`mark_changed`](Self::mark_changed) but skips the hysteresis
    /// check, so the item is re-examined even though it has not moved.
    /// Used when pairing attributes change under a stationary box.
    pub fn force_mark(&mut self, id: ItemId, aabb: &Aabb3, margin: f32) {
        self.ensure_slot(id.index());
        self.expanded[id.index()] = Some(aabb.grow(margin));
        if self.stamps[id.index()] == self.tick {
            return; // already queued this tick
        }
        self.stamps[id.index()] = self.tick;
        self.queue.push(id);
    }

    /// Forget the item entirely: scrub it from the queue, drop its expanded
    /// box, and reset its stamp to 0.
    ///
    /// Must run before the item's slot can be recycled; a reused slot then
    /// behaves exactly like a fresh one.
    pub fn unmark(&mut self, id: ItemId) {
        if let Some(n) = self.queue.iter().position(|q| *q == id) {
            self.queue.swap_remove(n);
        }
        if id.index() < self.expanded.len() {
            self.expanded[id.index()] = None;
            self.stamps[id.index()] = 0;
        }
    }

    /// Snapshot of the queue as of now, for one pairing pass.
    pub fn snapshot(&self) -> Vec<ItemId> {
        self.queue.clone()
    }

    /// End the tick: clear the queue and advance the counter.
    pub fn advance_tick(&mut self) {
        self.queue.clear();
        self.tick += 1;
    }
}
