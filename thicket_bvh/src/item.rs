// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item identifiers and per-item flags.

/// Identifier for an item stored in a [`Bvh`](crate::Bvh).
///
/// This is a small, copyable handle that stays stable across updates but
/// becomes invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ItemId` that pointed to that
///   slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a
///   new, distinct `ItemId`.
///
/// ### Ordering
///
/// `ItemId`s order by slot index, then generation. The pairing layer relies
/// on this total order to present every pair in a canonical
/// lower-handle-first orientation, so the order is part of the public
/// contract, not an implementation detail.
///
/// ### Liveness
///
/// Use [`Bvh::is_alive`](crate::Bvh::is_alive) to check whether an `ItemId`
/// still refers to a live item. Stale ids never alias a different live item
/// because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ItemId(pub(crate) u32, pub(crate) u32);

impl ItemId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    /// The slot index underlying this id.
    ///
    /// Slots are reused, so two ids may share an index across removals; use
    /// this only for side tables that are maintained in lockstep with
    /// insert/remove (the pairing layer does exactly that).
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The generation of this id.
    pub const fn generation(self) -> u32 {
        self.1
    }

    /// Rebuild an id from its raw parts.
    ///
    /// Intended for callers that round-trip ids through compact storage
    /// (see [`raw`](Self::raw)). Fabricating an id that was never produced
    /// by the tree it is used with is a contract violation: it is treated
    /// like any stale id and matches nothing.
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self(index, generation)
    }

    /// The raw (index, generation) parts of this id.
    pub const fn raw(self) -> (u32, u32) {
        (self.0, self.1)
    }
}

bitflags::bitflags! {
    /// Item flags controlling pairing eligibility.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        /// Item participates in pair tracking (further filtered by type/mask).
        const PAIRABLE = 0b0000_0001;
    }
}
