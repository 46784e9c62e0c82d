//! Slot addressing
//!
//! A `SlotIndex` names one physical slot of a `NodeArena`. It is a plain
//! integer: it confers no ownership and may go stale once its slot is
//! released. The "no slot" sentinel is `Option<SlotIndex>::None`, so chains
//! terminate in `None` rather than a magic value.

use serde::Serialize;

/// Physical position of a slot inside a `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotIndex(u32);

impl SlotIndex {
    pub const fn new(index: u32) -> Self {
        SlotIndex(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The index as a `usize`, for indexing into slot storage
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for SlotIndex {
    fn from(index: u32) -> Self {
        SlotIndex(index)
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One arena slot: a payload plus the link to the next slot in its chain.
///
/// Free slots are chained through `next` into the arena's free list and
/// their payload is `T::default()`. Occupied slots are chained by the list
/// that owns them. Only this crate rewrites `next`.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    pub(crate) value: T,
    pub(crate) next: Option<SlotIndex>,
    pub(crate) occupied: bool,
}

impl<T> Slot<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Next slot in this slot's chain, `None` at the tail
    pub fn next(&self) -> Option<SlotIndex> {
        self.next
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }
}
