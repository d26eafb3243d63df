// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pair/unpair notification surface.

use thicket_bvh::ItemId;

/// One side of a pair notification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairEndpoint<P> {
    /// Handle of the item.
    pub id: ItemId,
    /// The item's payload.
    pub payload: P,
    /// The item's caller-defined subindex.
    pub subindex: i32,
}

/// Receiver for pair formation and dissolution notifications.
///
/// Notifications are delivered synchronously from [`BroadPhase::update`] and
/// [`BroadPhase::erase`], always with endpoints in canonical order (the lower
/// [`ItemId`] first), regardless of which item's movement triggered the
/// transition.
///
/// For every relation the sequence is strictly alternating: one
/// [`on_pair`](Self::on_pair), then one [`on_unpair`](Self::on_unpair)
/// carrying the token the formation returned, possibly repeated. No relation
/// ever sees two formations or two dissolutions in a row.
///
/// [`BroadPhase::update`]: crate::BroadPhase::update
/// [`BroadPhase::erase`]: crate::BroadPhase::erase
pub trait PairObserver<P> {
    /// Caller-owned bookkeeping value attached to each live relation.
    type Token: Copy;

    /// A new pair has formed. The returned token is stored with the relation.
    fn on_pair(&mut self, a: PairEndpoint<P>, b: PairEndpoint<P>) -> Self::Token;

    /// An existing pair has dissolved. `token` is the value
    /// [`on_pair`](Self::on_pair) returned when this relation formed.
    fn on_unpair(&mut self, a: PairEndpoint<P>, b: PairEndpoint<P>, token: Self::Token);
}
