// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The BVH itself: slot table, node arena, culling, incremental maintenance.

use alloc::vec::Vec;
use core::fmt::Debug;

use thicket_geom::Aabb3;

use crate::cull::CullQuery;
use crate::item::{ItemFlags, ItemId};

/// A margin that is either fixed or delegated to the tree's own heuristic.
///
/// The heuristic value is a fraction of the average live item size, so trees
/// full of large items get proportionally wider hysteresis bands.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Margin {
    /// Use the tree's heuristic value.
    #[default]
    Auto,
    /// Use a fixed non-negative margin.
    Fixed(f32),
}

impl Margin {
    /// Resolve against the tree's current heuristic value.
    #[inline]
    pub fn resolve(self, auto: f32) -> f32 {
        match self {
            Self::Auto => auto,
            Self::Fixed(v) => v.max(0.0),
        }
    }
}

/// Items per leaf before a split.
const MAX_LEAF: usize = 8;

/// Live items re-seated per [`Bvh::optimize_incremental`] call.
const OPTIMIZE_BATCH: usize = 8;

/// Heuristic margins are this fraction of the average item longest axis.
const AUTO_MARGIN_RATIO: f32 = 0.1;

#[derive(Clone, Debug)]
struct Item<P> {
    /// Exact box as last supplied by the caller.
    aabb: Aabb3,
    /// Expanded box actually stored in the tree; encloses `aabb`.
    leaf_aabb: Aabb3,
    payload: P,
    subindex: i32,
    flags: ItemFlags,
    pairable_type: u32,
    pairable_mask: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

enum Kind {
    Leaf(Vec<(usize, Aabb3)>),
    Internal { left: NodeIdx, right: NodeIdx },
}

struct Node {
    bbox: Aabb3,
    kind: Kind,
}

/// An incremental 3D bounding-volume hierarchy with generational handles.
///
/// `P` is a small copyable payload returned from queries, typically an index
/// or key into caller-side storage.
pub struct Bvh<P> {
    items: Vec<Option<Item<P>>>,
    /// Last generation per slot; persists across frees.
    generations: Vec<u32>,
    free_list: Vec<usize>,
    arena: Vec<Node>,
    /// Recycled arena slots, refilled by sibling collapse.
    node_free: Vec<usize>,
    root: Option<NodeIdx>,
    node_expansion: Margin,
    live: usize,
    /// Sum of live items' longest axis sizes, for the heuristic margin.
    extent_sum: f64,
    /// Rotating slot cursor for incremental optimization.
    opt_cursor: usize,
}

impl<P> Default for Bvh<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Debug for Bvh<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bvh")
            .field("slots_total", &self.items.len())
            .field("live", &self.live)
            .field("arena_nodes", &self.arena.len())
            .field("has_root", &self.root.is_some())
            .field("node_expansion", &self.node_expansion)
            .finish_non_exhaustive()
    }
}

impl<P> Bvh<P> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            arena: Vec::new(),
            node_free: Vec::new(),
            root: None,
            node_expansion: Margin::Auto,
            live: 0,
            extent_sum: 0.0,
            opt_cursor: 0,
        }
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree holds no live items.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Set the leaf expansion margin applied to stored volumes.
    pub fn set_node_expansion(&mut self, margin: Margin) {
        self.node_expansion = margin;
    }

    /// The tree's heuristic margin: a fraction of the average live item size.
    ///
    /// The pairing layer uses this same value when its own margin is
    /// [`Margin::Auto`].
    pub fn heuristic_margin(&self) -> f32 {
        if self.live == 0 {
            return 0.0;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "average extent fits f32 whenever the inputs did"
        )]
        let avg = (self.extent_sum / self.live as f64) as f32;
        avg * AUTO_MARGIN_RATIO
    }

    fn node_margin(&self) -> f32 {
        self.node_expansion.resolve(self.heuristic_margin())
    }

    /// Whether `id` refers to a live item.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    fn item(&self, id: ItemId) -> Option<&Item<P>> {
        let it = self.items.get(id.index())?.as_ref()?;
        (self.generations[id.index()] == id.generation()).then_some(it)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut Item<P>> {
        let generation = *self.generations.get(id.index())?;
        if generation != id.generation() {
            return None;
        }
        self.items.get_mut(id.index())?.as_mut()
    }

    /// The item's exact (unexpanded) box.
    pub fn aabb(&self, id: ItemId) -> Option<Aabb3> {
        self.item(id).map(|it| it.aabb)
    }

    /// The item's subindex.
    pub fn subindex(&self, id: ItemId) -> Option<i32> {
        self.item(id).map(|it| it.subindex)
    }

    /// Whether the item is pairable.
    pub fn is_pairable(&self, id: ItemId) -> bool {
        self.item(id)
            .is_some_and(|it| it.flags.contains(ItemFlags::PAIRABLE))
    }

    /// The item's pairable type bits.
    pub fn pairable_type(&self, id: ItemId) -> Option<u32> {
        self.item(id).map(|it| it.pairable_type)
    }

    /// The item's pairable mask bits.
    pub fn pairable_mask(&self, id: ItemId) -> Option<u32> {
        self.item(id).map(|it| it.pairable_mask)
    }

    /// Update pairing attributes. No-op on a stale id.
    pub fn set_pairable(&mut self, id: ItemId, pairable: bool, pairable_type: u32, mask: u32) {
        if let Some(it) = self.item_mut(id) {
            it.flags.set(ItemFlags::PAIRABLE, pairable);
            it.pairable_type = pairable_type;
            it.pairable_mask = mask;
        }
    }
}

impl<P: Copy> Bvh<P> {
    /// The item's payload.
    pub fn payload(&self, id: ItemId) -> Option<P> {
        self.item(id).map(|it| it.payload)
    }

    /// Insert a new item. Returns a stable generational handle.
    pub fn insert(
        &mut self,
        aabb: Aabb3,
        payload: P,
        subindex: i32,
        pairable: bool,
        pairable_type: u32,
        pairable_mask: u32,
    ) -> ItemId {
        let leaf_aabb = aabb.grow(self.node_margin());
        let mut flags = ItemFlags::empty();
        flags.set(ItemFlags::PAIRABLE, pairable);
        let item = Item {
            aabb,
            leaf_aabb,
            payload,
            subindex,
            flags,
            pairable_type,
            pairable_mask,
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].saturating_add(1);
            self.items[idx] = Some(item);
            idx
        } else {
            self.items.push(Some(item));
            self.generations.push(1);
            self.items.len() - 1
        };
        self.live += 1;
        self.extent_sum += f64::from(aabb.longest_axis_size());
        self.tree_insert(idx, leaf_aabb);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ItemId uses 32-bit indices by design"
        )]
        let idx_u32 = idx as u32;
        ItemId::new(idx_u32, self.generations[idx])
    }

    /// Move an item to a new box.
    ///
    /// Returns whether the stored volume actually changed. Movements absorbed
    /// by the leaf expansion margin update the exact box but leave the tree
    /// untouched and return `false`.
    pub fn update(&mut self, id: ItemId, aabb: Aabb3) -> bool {
        let margin = self.node_margin();
        let Some(it) = self.item_mut(id) else {
            return false;
        };
        let old_extent = f64::from(it.aabb.longest_axis_size());
        it.aabb = aabb;
        if it.leaf_aabb.encloses(&aabb) {
            self.extent_sum += f64::from(aabb.longest_axis_size()) - old_extent;
            return false;
        }
        let old_leaf = it.leaf_aabb;
        let new_leaf = aabb.grow(margin);
        it.leaf_aabb = new_leaf;
        self.extent_sum += f64::from(aabb.longest_axis_size()) - old_extent;
        self.tree_remove(id.index(), &old_leaf);
        self.tree_insert(id.index(), new_leaf);
        true
    }

    /// Remove an item. No-op on a stale id.
    pub fn remove(&mut self, id: ItemId) {
        let Some(it) = self.item(id) else {
            return;
        };
        let old_leaf = it.leaf_aabb;
        let old_extent = f64::from(it.aabb.longest_axis_size());
        self.tree_remove(id.index(), &old_leaf);
        self.items[id.index()] = None;
        self.free_list.push(id.index());
        self.live -= 1;
        self.extent_sum -= old_extent;
        if self.live == 0 {
            // cheap to start from scratch; also clears collapsed leftovers
            self.arena.clear();
            self.node_free.clear();
            self.root = None;
            self.extent_sum = 0.0;
        }
    }

    /// Collect up to `max` live items matching the query into `out`.
    ///
    /// `out` is not cleared. The per-item test runs against the exact box,
    /// not the expanded leaf volume, so results do not depend on margins.
    pub fn cull(&self, query: &CullQuery<'_>, out: &mut Vec<ItemId>, max: usize) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = Vec::new();
        stack.push(root);
        while let Some(idx) = stack.pop() {
            if out.len() >= max {
                return;
            }
            let node = &self.arena[idx.get()];
            if !query.shape.hits_aabb(&node.bbox) {
                continue;
            }
            match &node.kind {
                Kind::Internal { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
                Kind::Leaf(entries) => {
                    for (slot, _) in entries {
                        if out.len() >= max {
                            return;
                        }
                        let Some(it) = self.items[*slot].as_ref() else {
                            debug_assert!(false, "dead slot referenced by a leaf");
                            continue;
                        };
                        if query.pairable_only && !it.flags.contains(ItemFlags::PAIRABLE) {
                            continue;
                        }
                        if !query.mask_hit(it.pairable_type, it.pairable_mask) {
                            continue;
                        }
                        if !query.shape.hits_aabb(&it.aabb) {
                            continue;
                        }
                        #[allow(
                            clippy::cast_possible_truncation,
                            reason = "ItemId uses 32-bit indices by design"
                        )]
                        let slot_idx = *slot as u32;
                        out.push(ItemId::new(slot_idx, self.generations[*slot]));
                    }
                }
            }
        }
    }

    /// Perform a bounded amount of tree maintenance.
    ///
    /// Re-seats up to a fixed number of live items per call, walking the slot
    /// space with a rotating cursor, and re-tightens their expanded volumes.
    /// Called once per tick by the pairing layer; long-running motion
    /// gradually restores tree quality without rebuild spikes.
    pub fn optimize_incremental(&mut self) {
        if self.live == 0 {
            return;
        }
        let margin = self.node_margin();
        let slots = self.items.len();
        let mut reseated = 0;
        let mut visited = 0;
        while reseated < OPTIMIZE_BATCH && visited < slots {
            let slot = self.opt_cursor % slots;
            self.opt_cursor = (self.opt_cursor + 1) % slots;
            visited += 1;
            let Some(it) = self.items[slot].as_ref() else {
                continue;
            };
            let old_leaf = it.leaf_aabb;
            let new_leaf = it.aabb.grow(margin);
            self.tree_remove(slot, &old_leaf);
            if let Some(it) = self.items[slot].as_mut() {
                it.leaf_aabb = new_leaf;
            }
            self.tree_insert(slot, new_leaf);
            reseated += 1;
        }
    }

    /// Full consistency check; panics on violation. Debug/test use only.
    ///
    /// Verifies that every live slot is referenced by exactly one leaf entry,
    /// that no dead slot is referenced, and that every node's box encloses
    /// its contents.
    pub fn integrity_check(&self) {
        let mut seen = alloc::vec![0_u32; self.items.len()];
        if let Some(root) = self.root {
            self.check_node(root, &mut seen);
        }
        for (slot, item) in self.items.iter().enumerate() {
            match item {
                Some(_) => assert_eq!(
                    seen[slot], 1,
                    "live slot must appear in exactly one leaf entry"
                ),
                None => assert_eq!(seen[slot], 0, "dead slot must not be referenced"),
            }
        }
    }

    fn check_node(&self, idx: NodeIdx, seen: &mut [u32]) {
        let node = &self.arena[idx.get()];
        match &node.kind {
            Kind::Leaf(entries) => {
                for (slot, aabb) in entries {
                    seen[*slot] += 1;
                    assert!(
                        node.bbox.encloses(aabb),
                        "leaf box must enclose its entries"
                    );
                    let it = self.items[*slot].as_ref().expect("leaf entry must be live");
                    assert_eq!(*aabb, it.leaf_aabb, "leaf entry box must match the item");
                }
            }
            Kind::Internal { left, right } => {
                assert!(
                    node.bbox.encloses(&self.arena[left.get()].bbox),
                    "branch box must enclose left child"
                );
                assert!(
                    node.bbox.encloses(&self.arena[right.get()].bbox),
                    "branch box must enclose right child"
                );
                self.check_node(*left, seen);
                self.check_node(*right, seen);
            }
        }
    }

    //
    // node arena plumbing
    //

    fn tree_insert(&mut self, slot: usize, bbox: Aabb3) {
        match self.root {
            None => {
                let idx = Self::alloc_node(
                    &mut self.arena,
                    &mut self.node_free,
                    Node {
                        bbox,
                        kind: Kind::Leaf(alloc::vec![(slot, bbox)]),
                    },
                );
                self.root = Some(NodeIdx(idx));
            }
            Some(root) => {
                Self::insert_node(&mut self.arena, &mut self.node_free, root.get(), slot, bbox);
            }
        }
    }

    fn tree_remove(&mut self, slot: usize, old: &Aabb3) {
        if let Some(root) = self.root {
            let _ = Self::remove_node(&mut self.arena, &mut self.node_free, root.get(), slot, old);
        }
    }

    /// Place a node in a recycled arena slot, or append when none is free.
    fn alloc_node(arena: &mut Vec<Node>, free: &mut Vec<usize>, node: Node) -> usize {
        if let Some(idx) = free.pop() {
            arena[idx] = node;
            idx
        } else {
            arena.push(node);
            arena.len() - 1
        }
    }

    fn insert_node(
        arena: &mut Vec<Node>,
        free: &mut Vec<usize>,
        node_idx: usize,
        slot: usize,
        bbox: Aabb3,
    ) {
        let kind = core::mem::replace(&mut arena[node_idx].kind, Kind::Leaf(Vec::new()));
        match kind {
            Kind::Leaf(mut entries) => {
                entries.push((slot, bbox));
                let mut node_bbox = arena[node_idx].bbox.union(&bbox);
                let new_kind = if entries.len() > MAX_LEAF {
                    let (l, r) = split_sah(entries);
                    let l_idx = Self::alloc_node(
                        arena,
                        free,
                        Node {
                            bbox: bbox_entries(&l),
                            kind: Kind::Leaf(l),
                        },
                    );
                    let r_idx = Self::alloc_node(
                        arena,
                        free,
                        Node {
                            bbox: bbox_entries(&r),
                            kind: Kind::Leaf(r),
                        },
                    );
                    node_bbox = arena[l_idx].bbox.union(&arena[r_idx].bbox);
                    Kind::Internal {
                        left: NodeIdx(l_idx),
                        right: NodeIdx(r_idx),
                    }
                } else {
                    Kind::Leaf(entries)
                };
                arena[node_idx].kind = new_kind;
                arena[node_idx].bbox = node_bbox;
            }
            Kind::Internal { left, right } => {
                // descend toward the smaller surface-area growth
                let lb = arena[left.get()].bbox;
                let rb = arena[right.get()].bbox;
                let cost_l = lb.union(&bbox).surface_area() - lb.surface_area();
                let cost_r = rb.union(&bbox).surface_area() - rb.surface_area();
                if cost_l <= cost_r {
                    Self::insert_node(arena, free, left.get(), slot, bbox);
                } else {
                    Self::insert_node(arena, free, right.get(), slot, bbox);
                }
                let node_bbox = arena[node_idx].bbox.union(&bbox);
                arena[node_idx].kind = Kind::Internal { left, right };
                arena[node_idx].bbox = node_bbox;
            }
        }
    }

    fn remove_node(
        arena: &mut Vec<Node>,
        free: &mut Vec<usize>,
        node_idx: usize,
        slot: usize,
        old: &Aabb3,
    ) -> bool {
        if !arena[node_idx].bbox.intersects(old) {
            return false;
        }
        let kind = core::mem::replace(&mut arena[node_idx].kind, Kind::Leaf(Vec::new()));
        let (new_kind, new_bbox, removed) = match kind {
            Kind::Leaf(mut entries) => {
                let before = entries.len();
                entries.retain(|(s, _)| *s != slot);
                let removed = entries.len() != before;
                let bbox = bbox_entries(&entries);
                (Kind::Leaf(entries), bbox, removed)
            }
            Kind::Internal { left, right } => {
                let removed = Self::remove_node(arena, free, left.get(), slot, old)
                    | Self::remove_node(arena, free, right.get(), slot, old);
                let left_empty = matches!(arena[left.get()].kind, Kind::Leaf(ref v) if v.is_empty());
                let right_empty =
                    matches!(arena[right.get()].kind, Kind::Leaf(ref v) if v.is_empty());
                if removed && left_empty && !right_empty {
                    // collapse the surviving child into this node and
                    // recycle both child slots
                    let kind =
                        core::mem::replace(&mut arena[right.get()].kind, Kind::Leaf(Vec::new()));
                    let bbox = arena[right.get()].bbox;
                    free.push(left.get());
                    free.push(right.get());
                    (kind, bbox, true)
                } else if removed && right_empty && !left_empty {
                    let kind =
                        core::mem::replace(&mut arena[left.get()].kind, Kind::Leaf(Vec::new()));
                    let bbox = arena[left.get()].bbox;
                    free.push(left.get());
                    free.push(right.get());
                    (kind, bbox, true)
                } else {
                    let bbox = arena[left.get()].bbox.union(&arena[right.get()].bbox);
                    (Kind::Internal { left, right }, bbox, removed)
                }
            }
        };
        arena[node_idx].kind = new_kind;
        arena[node_idx].bbox = new_bbox;
        removed
    }
}

fn bbox_entries(entries: &[(usize, Aabb3)]) -> Aabb3 {
    let mut it = entries.iter();
    if let Some((_, first)) = it.next() {
        let mut acc = *first;
        for (_, bb) in it {
            acc = acc.union(bb);
        }
        acc
    } else {
        Aabb3::ZERO
    }
}

/// SAH-like split: sort along each axis, precompute prefix/suffix boxes, and
/// choose `k` minimizing `area(LB_k) * k + area(RB_k) * (n - k)`.
fn split_sah(mut entries: Vec<(usize, Aabb3)>) -> (Vec<(usize, Aabb3)>, Vec<(usize, Aabb3)>) {
    let n = entries.len();
    let min_children = (MAX_LEAF / 2).max(2).min(n.saturating_sub(2));
    let mut best: Option<(f64, Vec<(usize, Aabb3)>, Vec<(usize, Aabb3)>)> = None;
    for axis in 0..3 {
        entries.sort_by(|a, b| {
            let ca = a.1.center().axis(axis);
            let cb = b.1.center().axis(axis);
            ca.partial_cmp(&cb).unwrap_or(core::cmp::Ordering::Equal)
        });

        let mut prefix: Vec<Aabb3> = Vec::with_capacity(n);
        for (i, (_, bb)) in entries.iter().enumerate() {
            if i == 0 {
                prefix.push(*bb);
            } else {
                let prev = *prefix.last().expect("prefix is non-empty here");
                prefix.push(prev.union(bb));
            }
        }
        let mut suffix: Vec<Aabb3> = Vec::with_capacity(n);
        for (i, (_, bb)) in entries.iter().enumerate().rev() {
            if i == n - 1 {
                suffix.push(*bb);
            } else {
                let prev = *suffix.last().expect("suffix is non-empty here");
                suffix.push(bb.union(&prev));
            }
        }
        suffix.reverse();

        for k in min_children..=(n - min_children) {
            let lb = prefix[k - 1];
            let rb = suffix[k];
            let cost = lb.surface_area() * k as f64 + rb.surface_area() * (n - k) as f64;
            if best.as_ref().map(|(bc, _, _)| cost < *bc).unwrap_or(true) {
                best = Some((cost, entries[..k].to_vec(), entries[k..].to_vec()));
            }
        }
    }
    let (_, l, r) = best.expect("split requires at least 4 entries");
    (l, r)
}
