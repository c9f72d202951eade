//! Pure wishlist state transitions
//!
//! Toggling is optimistic: the caller flips what it displays first and the
//! write follows. This module holds the parts of that dance that involve
//! no I/O:
//! - `ToggleIntent::for_membership`: which write a toggle turns into
//! - `MembershipView`: caller-side state that applies optimistic flips,
//!   undoes them on a reported failure, and is replaced wholesale by every
//!   subscription snapshot

use std::collections::{BTreeMap, BTreeSet};

/// The store write a toggle performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleIntent {
    /// Create the membership record
    Add,
    /// Delete the membership record
    Remove,
}

impl ToggleIntent {
    /// Members are removed, non-members are added
    pub fn for_membership(currently_member: bool) -> Self {
        if currently_member {
            ToggleIntent::Remove
        } else {
            ToggleIntent::Add
        }
    }

    /// Membership once the write lands
    pub fn resulting_membership(&self) -> bool {
        matches!(self, ToggleIntent::Add)
    }
}

/// What a caller displays: the last confirmed snapshot plus any
/// optimistic flips not yet confirmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipView {
    confirmed: BTreeSet<String>,
    pending: BTreeMap<String, bool>,
}

impl MembershipView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed membership for one item
    pub fn contains(&self, item_id: &str) -> bool {
        self.pending
            .get(item_id)
            .copied()
            .unwrap_or_else(|| self.confirmed.contains(item_id))
    }

    /// Displayed membership for every item
    pub fn items(&self) -> BTreeSet<String> {
        let mut items = self.confirmed.clone();
        for (item_id, member) in &self.pending {
            if *member {
                items.insert(item_id.clone());
            } else {
                items.remove(item_id);
            }
        }
        items
    }

    /// Flip an item before the write is confirmed
    ///
    /// Returns the intent to hand to the synchronizer, computed from the
    /// membership displayed *before* the flip.
    pub fn apply_optimistic(&mut self, item_id: &str) -> ToggleIntent {
        let intent = ToggleIntent::for_membership(self.contains(item_id));
        self.pending
            .insert(item_id.to_string(), intent.resulting_membership());
        intent
    }

    /// Undo an optimistic flip after its write failed
    pub fn rollback(&mut self, item_id: &str) {
        self.pending.remove(item_id);
    }

    /// Replace all state with an authoritative snapshot
    ///
    /// Pending flips are discarded: the snapshot always wins.
    pub fn apply_snapshot(&mut self, snapshot: BTreeSet<String>) {
        self.confirmed = snapshot;
        self.pending.clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
