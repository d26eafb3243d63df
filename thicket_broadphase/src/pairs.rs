// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-item pair relation storage.

use alloc::vec::Vec;

use thicket_bvh::ItemId;

/// The relations recorded against one item: a small unordered list of
/// (partner, token) entries.
///
/// Every relation is stored on both endpoints with the same token, so lookup
/// from either side is O(degree) without indirection. Removal is unordered
/// (swap-remove); iterating callers that remove during the scan must re-test
/// the same index afterwards.
#[derive(Clone, Debug)]
pub struct PairList<T> {
    entries: Vec<(ItemId, T)>,
}

impl<T> Default for PairList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PairList<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of relations recorded against this item.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the item has no relations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a relation with `other` is recorded.
    pub fn contains(&self, other: ItemId) -> bool {
        self.entries.iter().any(|(id, _)| *id == other)
    }

    /// Record a relation with `other`. The caller keeps the two sides in
    /// sync; duplicates are a logic error upstream.
    pub fn add(&mut self, other: ItemId, token: T) {
        debug_assert!(!self.contains(other), "duplicate pair entry");
        self.entries.push((other, token));
    }

    /// Remove the relation with `other`, returning its token.
    pub fn remove(&mut self, other: ItemId) -> Option<T> {
        let n = self.entries.iter().position(|(id, _)| *id == other)?;
        Some(self.entries.swap_remove(n).1)
    }

    /// The partner recorded at position `n`, if any.
    pub fn partner_at(&self, n: usize) -> Option<ItemId> {
        self.entries.get(n).map(|(id, _)| *id)
    }

    /// The first recorded partner, if any.
    pub fn first_partner(&self) -> Option<ItemId> {
        self.partner_at(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ItemId {
        ItemId::from_raw(n, 1)
    }

    #[test]
    fn add_remove_roundtrip() {
        let mut list: PairList<u64> = PairList::new();
        let (a, b) = (id(0), id(1));
        list.add(a, 10);
        list.add(b, 20);
        assert_eq!(list.len(), 2);
        assert!(list.contains(a));
        assert_eq!(list.remove(a), Some(10));
        assert!(!list.contains(a));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.first_partner(), Some(b));
    }

    #[test]
    fn swap_remove_keeps_remaining_entries_reachable() {
        let mut list: PairList<u64> = PairList::new();
        let ids = [id(0), id(1), id(2)];
        for (n, i) in ids.iter().enumerate() {
            list.add(*i, n as u64);
        }
        list.remove(ids[0]);
        // index 0 must now hold a live entry (the swapped-in last one)
        assert_eq!(list.partner_at(0), Some(ids[2]));
        assert_eq!(list.len(), 2);
    }
}
