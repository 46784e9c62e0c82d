//! Node Arena - fixed-capacity slot storage with a free-list allocator
//!
//! Lists never touch the heap: every node lives in one slot of a
//! fixed-size array owned by the arena, and is addressed by `SlotIndex`.
//!
//! Design:
//! - Free slots are threaded into a singly linked free list through
//!   their `next` field, initially `0 -> 1 -> ... -> N-1 -> None`
//! - `allocate` pops the free-list head, `release` pushes onto it (LIFO)
//! - Each slot carries an occupied tag, so releasing a free slot is
//!   rejected instead of corrupting the free list
//! - Capacity is fixed at construction; the arena never grows
//!
//! Sharing:
//! - The arena knows nothing about the lists using it
//! - Several `IndexedList`s may share one arena through `NodeArena::shared`;
//!   keeping slots disjoint across lists is their joint responsibility
//! - Single-threaded only: the `RefCell` wrapper is the whole
//!   synchronization story

use crate::error::ArenaError;
use crate::index::{Slot, SlotIndex};
use serde::Serialize;
use std::cell::RefCell;
use std::ops::{Index, IndexMut};
use tracing::{debug, trace, warn};

/// Fixed-capacity array of slots plus the free list threading the unused ones.
#[derive(Debug)]
pub struct NodeArena<T> {
    /// Slot storage; index in this slice is the `SlotIndex`
    slots: Box<[Slot<T>]>,

    /// Head of the free list (or None when every slot is occupied)
    free_head: Option<SlotIndex>,

    /// Number of slots currently on the free list
    free_len: usize,
}

impl<T: Default> NodeArena<T> {
    /// Create an arena with every slot free and linked in index order.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or does not fit a `u32` slot index.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "NodeArena capacity must be positive");
        assert!(
            capacity <= u32::MAX as usize,
            "NodeArena capacity {} exceeds u32 slot indices",
            capacity
        );

        let slots: Vec<Slot<T>> = (0..capacity)
            .map(|i| Slot {
                value: T::default(),
                next: (i + 1 < capacity).then(|| SlotIndex::new((i + 1) as u32)),
                occupied: false,
            })
            .collect();

        NodeArena {
            slots: slots.into_boxed_slice(),
            free_head: Some(SlotIndex::new(0)),
            free_len: capacity,
        }
    }

    /// Create an arena ready to be shared by several lists.
    pub fn shared(capacity: usize) -> RefCell<Self> {
        RefCell::new(Self::new(capacity))
    }

    /// Return a slot to the free list.
    ///
    /// The slot's payload is reset to `T::default()` and the previous value
    /// is handed back. The slot becomes the new free-list head, so the next
    /// `allocate` reuses it.
    pub fn release(&mut self, index: SlotIndex) -> Result<T, ArenaError> {
        self.check_bounds(index)?;
        let free_head = self.free_head;
        let slot = &mut self.slots[index.as_usize()];
        if !slot.occupied {
            warn!(%index, "rejected release of a free slot");
            return Err(ArenaError::DoubleRelease { index });
        }

        let value = std::mem::take(&mut slot.value);
        slot.occupied = false;
        slot.next = free_head;
        self.free_head = Some(index);
        self.free_len += 1;
        trace!(%index, free = self.free_len, "released slot");
        Ok(value)
    }

    /// Release a slot that a list chain guarantees to be occupied.
    ///
    /// # Panics
    /// Panics if the slot is out of range or already free, which means a
    /// list chain no longer matches the arena's bookkeeping.
    pub(crate) fn reclaim(&mut self, index: SlotIndex) -> T {
        match self.release(index) {
            Ok(value) => value,
            Err(e) => panic!("list chain out of sync with arena: {}", e),
        }
    }
}

impl<T> NodeArena<T> {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Pop a slot off the free list.
    ///
    /// The returned slot is marked occupied with `next == None`; its payload
    /// is whatever the arena left there (`T::default()` for a fresh or
    /// released slot). Fails with `Exhausted` and no side effect when the
    /// free list is empty.
    pub fn allocate(&mut self) -> Result<SlotIndex, ArenaError> {
        let Some(index) = self.free_head else {
            debug!(capacity = self.capacity(), "arena exhausted");
            return Err(ArenaError::Exhausted {
                capacity: self.capacity(),
            });
        };

        let slot = &mut self.slots[index.as_usize()];
        self.free_head = slot.next.take();
        slot.occupied = true;
        self.free_len -= 1;
        trace!(%index, free = self.free_len, "allocated slot");
        Ok(index)
    }

    /// Claim one specific slot, unlinking it from wherever it sits in the free list.
    ///
    /// Returns false if the index is out of range or the slot is already
    /// occupied. The free list is not indexed, so this is a linear walk.
    pub fn acquire_at(&mut self, index: SlotIndex) -> bool {
        if index.as_usize() >= self.capacity() || self.slots[index.as_usize()].occupied {
            return false;
        }

        let mut prev: Option<SlotIndex> = None;
        let mut cur = self.free_head;
        while let Some(i) = cur {
            if i == index {
                break;
            }
            prev = cur;
            cur = self.slots[i.as_usize()].next;
        }

        // A free-tagged slot missing from the free chain means the chain is broken
        if cur.is_none() {
            warn!(%index, "free slot not found on free list");
            return false;
        }

        let next = self.slots[index.as_usize()].next.take();
        match prev {
            None => self.free_head = next,
            Some(p) => self.slots[p.as_usize()].next = next,
        }
        self.slots[index.as_usize()].occupied = true;
        self.free_len -= 1;
        trace!(%index, free = self.free_len, "acquired specific slot");
        true
    }

    /// Bounds-checked access to a slot.
    pub fn at(&self, index: SlotIndex) -> Result<&Slot<T>, ArenaError> {
        self.check_bounds(index)?;
        Ok(&self.slots[index.as_usize()])
    }

    /// Bounds-checked mutable access to a slot.
    pub fn at_mut(&mut self, index: SlotIndex) -> Result<&mut Slot<T>, ArenaError> {
        self.check_bounds(index)?;
        Ok(&mut self.slots[index.as_usize()])
    }

    pub fn free_count(&self) -> usize {
        self.free_len
    }

    pub fn used_count(&self) -> usize {
        self.capacity() - self.free_len
    }

    /// True if the slot is on the free list. Out-of-range indices are never free.
    pub fn is_free(&self, index: SlotIndex) -> bool {
        self.slots
            .get(index.as_usize())
            .is_some_and(|slot| !slot.occupied)
    }

    /// Free slot indices in free-list order (next allocation first).
    pub fn free_indices(&self) -> Vec<SlotIndex> {
        let mut out = Vec::with_capacity(self.free_len);
        let mut cur = self.free_head;
        while let Some(i) = cur {
            out.push(i);
            cur = self.slots[i.as_usize()].next;
        }
        out
    }

    /// Occupied slot indices in slot-array order.
    pub fn used_indices(&self) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(i, _)| SlotIndex::new(i as u32))
            .collect()
    }

    /// Exchange the payloads of two slots, leaving both `next` links in place.
    pub(crate) fn swap_values(&mut self, a: SlotIndex, b: SlotIndex) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi.as_usize());
        std::mem::swap(&mut left[lo.as_usize()].value, &mut right[0].value);
    }

    /// Get current occupancy statistics
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity(),
            free: self.free_count(),
            used: self.used_count(),
        }
    }

    /// Verify the free list agrees with the per-slot tags.
    ///
    /// Walks the free chain (bounded by capacity, so a cycle is detected)
    /// and checks that it visits exactly the untagged slots.
    pub fn check_integrity(&self) -> bool {
        let mut seen = 0usize;
        let mut cur = self.free_head;
        while let Some(i) = cur {
            if seen == self.capacity() {
                return false;
            }
            let Some(slot) = self.slots.get(i.as_usize()) else {
                return false;
            };
            if slot.occupied {
                return false;
            }
            seen += 1;
            cur = slot.next;
        }

        let untagged = self.slots.iter().filter(|slot| !slot.occupied).count();
        seen == self.free_len && untagged == self.free_len
    }

    fn check_bounds(&self, index: SlotIndex) -> Result<(), ArenaError> {
        if index.as_usize() < self.capacity() {
            Ok(())
        } else {
            Err(ArenaError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            })
        }
    }
}

/// Out-of-range indexing is a programming error and panics.
impl<T> Index<SlotIndex> for NodeArena<T> {
    type Output = Slot<T>;

    fn index(&self, index: SlotIndex) -> &Slot<T> {
        match self.at(index) {
            Ok(slot) => slot,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T> IndexMut<SlotIndex> for NodeArena<T> {
    fn index_mut(&mut self, index: SlotIndex) -> &mut Slot<T> {
        match self.at_mut(index) {
            Ok(slot) => slot,
            Err(e) => panic!("{}", e),
        }
    }
}

/// Arena occupancy snapshot for diagnostics and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    pub capacity: usize,
    pub free: usize,
    pub used: usize,
}
