//! Indexed List - singly linked list threaded through arena slots
//!
//! An `IndexedList` owns nothing but the index of its head slot. Every
//! node lives in a shared `NodeArena`; structural changes are rewrites of
//! the slots' `next` links, and all addressing is by `SlotIndex`.
//!
//! ```text
//!   head = 3
//!     │
//!     ▼
//!   slot 3 ──▶ slot 0 ──▶ slot 4 ──▶ None
//!   "A"        "B"        "C"
//! ```
//!
//! Invariants:
//! - Following `next` from `head` reaches `None` within `capacity` steps
//! - Every slot on the chain is occupied in the arena
//! - No slot is on two chains; copying operations (`try_clone`,
//!   `append_copy`, `+`) always allocate fresh slots
//!
//! Inserts fail with `ArenaError::Exhausted` when the arena is full. The
//! list never evicts on its own; a caller wanting "make room and retry"
//! deletes something and calls the insert again.
//!
//! The arena is borrowed for the duration of each operation only, so the
//! list must not be used re-entrantly from inside a value's `Drop` or
//! comparison impl. Dropping a non-empty list while a `get_at` guard on
//! the same arena is alive panics.

use crate::arena::NodeArena;
use crate::error::{ArenaError, ListError};
use crate::index::SlotIndex;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Add;
use tracing::{debug, warn};

/// A singly linked list whose nodes are slots of a shared `NodeArena`.
pub struct IndexedList<'a, T: Default> {
    arena: &'a RefCell<NodeArena<T>>,
    head: Option<SlotIndex>,
}

// =============================================================================
// Chain helpers
// =============================================================================
//
// These take the arena explicitly so they can run while an operation holds
// the arena borrow.

fn alloc_node<T>(
    arena: &mut NodeArena<T>,
    value: T,
    next: Option<SlotIndex>,
) -> Result<SlotIndex, ArenaError> {
    let index = arena.allocate()?;
    let slot = &mut arena[index];
    slot.value = value;
    slot.next = next;
    Ok(index)
}

fn tail_of<T>(arena: &NodeArena<T>, head: Option<SlotIndex>) -> Option<SlotIndex> {
    let mut cur = head?;
    while let Some(next) = arena[cur].next {
        cur = next;
    }
    Some(cur)
}

fn chain_len<T>(arena: &NodeArena<T>, head: Option<SlotIndex>) -> usize {
    let mut count = 0;
    let mut cur = head;
    while let Some(i) = cur {
        count += 1;
        cur = arena[i].next;
    }
    count
}

/// Slot at logical position `pos`, if the chain is that long
fn nth_slot<T>(arena: &NodeArena<T>, head: Option<SlotIndex>, pos: usize) -> Option<SlotIndex> {
    let mut cur = head;
    for _ in 0..pos {
        cur = arena[cur?].next;
    }
    cur
}

/// First slot holding `key`, along with its predecessor on the chain
fn find_with_prev<T: PartialEq>(
    arena: &NodeArena<T>,
    head: Option<SlotIndex>,
    key: &T,
) -> Option<(Option<SlotIndex>, SlotIndex)> {
    let mut prev = None;
    let mut cur = head;
    while let Some(i) = cur {
        if arena[i].value == *key {
            return Some((prev, i));
        }
        prev = cur;
        cur = arena[i].next;
    }
    None
}

/// Link `cur`'s successor to `prev` (or to the head when `prev` is None).
/// `cur` is left dangling for the caller to reclaim.
fn unlink<T>(
    arena: &mut NodeArena<T>,
    head: &mut Option<SlotIndex>,
    prev: Option<SlotIndex>,
    cur: SlotIndex,
) {
    let next = arena[cur].next;
    match prev {
        None => *head = next,
        Some(p) => arena[p].next = next,
    }
}

impl<'a, T: Default> IndexedList<'a, T> {
    /// Create an empty list backed by `arena`.
    pub fn new(arena: &'a RefCell<NodeArena<T>>) -> Self {
        IndexedList { arena, head: None }
    }

    /// The arena this list allocates from
    pub fn arena(&self) -> &'a RefCell<NodeArena<T>> {
        self.arena
    }

    /// Slot index of the first element
    pub fn head(&self) -> Option<SlotIndex> {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of elements (walks the chain)
    pub fn len(&self) -> usize {
        chain_len(&self.arena.borrow(), self.head)
    }

    /// Release every slot of this list back to the arena.
    ///
    /// Slots owned by other lists sharing the arena are untouched.
    pub fn clear(&mut self) {
        let mut arena = self.arena.borrow_mut();
        let mut released = 0usize;
        let mut cur = self.head.take();
        while let Some(i) = cur {
            cur = arena[i].next;
            arena.reclaim(i);
            released += 1;
        }
        debug!(released, "list cleared");
    }

    /// Physical slot indices of the chain, in logical order
    pub fn slots(&self) -> Vec<SlotIndex> {
        let arena = self.arena.borrow();
        let mut out = Vec::new();
        let mut cur = self.head;
        while let Some(i) = cur {
            out.push(i);
            cur = arena[i].next;
        }
        out
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert at the head.
    pub fn insert_front(&mut self, value: T) -> Result<SlotIndex, ListError> {
        let mut arena = self.arena.borrow_mut();
        let index = alloc_node(&mut arena, value, self.head)?;
        self.head = Some(index);
        Ok(index)
    }

    /// Append at the tail (O(n) walk to find it).
    pub fn insert_back(&mut self, value: T) -> Result<SlotIndex, ListError> {
        let mut arena = self.arena.borrow_mut();
        let index = alloc_node(&mut arena, value, None)?;
        match tail_of(&arena, self.head) {
            None => self.head = Some(index),
            Some(tail) => arena[tail].next = Some(index),
        }
        Ok(index)
    }

    /// Claim the physical slot `slot` and append it at the logical tail.
    ///
    /// This places the value in a caller-chosen array slot; it does not
    /// insert at logical position `slot`. Returns `Ok(false)` if the slot is
    /// already occupied (by this or any other list sharing the arena), and
    /// `IndexOutOfRange` if it is outside the arena.
    pub fn insert_at_slot(&mut self, slot: SlotIndex, value: T) -> Result<bool, ListError> {
        let mut arena = self.arena.borrow_mut();
        arena.at(slot)?;
        if !arena.acquire_at(slot) {
            return Ok(false);
        }

        arena[slot].value = value;
        arena[slot].next = None;
        match tail_of(&arena, self.head) {
            None => self.head = Some(slot),
            Some(tail) => arena[tail].next = Some(slot),
        }
        Ok(true)
    }

    /// Insert so the value ends up at logical position `pos` (0 ≤ pos ≤ len).
    pub fn insert_at_position(&mut self, pos: usize, value: T) -> Result<SlotIndex, ListError> {
        let mut arena = self.arena.borrow_mut();
        let len = chain_len(&arena, self.head);
        if pos > len {
            return Err(ListError::InvalidPosition { position: pos, len });
        }

        if pos == 0 {
            let index = alloc_node(&mut arena, value, self.head)?;
            self.head = Some(index);
            return Ok(index);
        }

        // pos <= len, so the predecessor exists
        let Some(prev) = nth_slot(&arena, self.head, pos - 1) else {
            return Err(ListError::InvalidPosition { position: pos, len });
        };
        let next = arena[prev].next;
        let index = alloc_node(&mut arena, value, next)?;
        arena[prev].next = Some(index);
        Ok(index)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove and return the first element.
    pub fn delete_front(&mut self) -> Option<T> {
        let mut arena = self.arena.borrow_mut();
        let head = self.head?;
        self.head = arena[head].next;
        Some(arena.reclaim(head))
    }

    /// Remove and return the last element.
    pub fn delete_back(&mut self) -> Option<T> {
        let mut arena = self.arena.borrow_mut();
        let mut prev = None;
        let mut cur = self.head?;
        while let Some(next) = arena[cur].next {
            prev = Some(cur);
            cur = next;
        }
        match prev {
            None => self.head = None,
            Some(p) => arena[p].next = None,
        }
        Some(arena.reclaim(cur))
    }

    /// Unlink the node stored in physical slot `slot`, wherever it sits.
    ///
    /// Returns None if the slot is not on this list's chain, including
    /// out-of-range indices and slots owned by another list.
    pub fn remove_slot(&mut self, slot: SlotIndex) -> Option<T> {
        let mut arena = self.arena.borrow_mut();
        if arena.at(slot).is_err() {
            return None;
        }

        let mut prev = None;
        let mut cur = self.head;
        while let Some(i) = cur {
            if i == slot {
                unlink(&mut arena, &mut self.head, prev, i);
                return Some(arena.reclaim(i));
            }
            prev = cur;
            cur = arena[i].next;
        }
        None
    }

    /// Remove and return the element at logical position `pos` (0 ≤ pos < len).
    pub fn remove_at_position(&mut self, pos: usize) -> Result<T, ListError> {
        let mut arena = self.arena.borrow_mut();
        let len = chain_len(&arena, self.head);
        if pos >= len {
            return Err(ListError::InvalidPosition { position: pos, len });
        }

        let (prev, target) = if pos == 0 {
            (None, self.head)
        } else {
            let prev = nth_slot(&arena, self.head, pos - 1);
            (prev, prev.and_then(|p| arena[p].next))
        };
        let Some(target) = target else {
            return Err(ListError::InvalidPosition { position: pos, len });
        };
        unlink(&mut arena, &mut self.head, prev, target);
        Ok(arena.reclaim(target))
    }

    // =========================================================================
    // Restructuring
    // =========================================================================

    /// Reverse the chain in place by flipping every `next` link.
    pub fn reverse(&mut self) {
        let mut arena = self.arena.borrow_mut();
        let mut prev = None;
        let mut cur = self.head;
        while let Some(i) = cur {
            cur = arena[i].next;
            arena[i].next = prev;
            prev = Some(i);
        }
        self.head = prev;
    }

    /// Slot index of the element at logical position `pos`.
    fn checked_slot(&self, pos: usize) -> Result<SlotIndex, ListError> {
        let arena = self.arena.borrow();
        nth_slot(&arena, self.head, pos).ok_or_else(|| ListError::InvalidPosition {
            position: pos,
            len: chain_len(&arena, self.head),
        })
    }

    /// Borrow the element at logical position `pos` (0 ≤ pos < len).
    ///
    /// The returned guard holds a shared borrow of the arena; drop it before
    /// mutating any list that shares the arena.
    pub fn get_at(&self, pos: usize) -> Result<Ref<'a, T>, ListError> {
        let index = self.checked_slot(pos)?;
        let arena = self.arena;
        Ok(Ref::map(arena.borrow(), |arena| &arena[index].value))
    }

    /// Mutably borrow the element at logical position `pos`.
    pub fn get_at_mut(&mut self, pos: usize) -> Result<RefMut<'a, T>, ListError> {
        let index = self.checked_slot(pos)?;
        let arena = self.arena;
        Ok(RefMut::map(arena.borrow_mut(), |arena| &mut arena[index].value))
    }
}

impl<'a, T: Default + PartialEq> IndexedList<'a, T> {
    /// Link a new node right after the first element equal to `key`.
    ///
    /// Returns `Ok(None)` without allocating if `key` is not present.
    pub fn insert_after(&mut self, key: &T, value: T) -> Result<Option<SlotIndex>, ListError> {
        let mut arena = self.arena.borrow_mut();
        let Some((_, at)) = find_with_prev(&arena, self.head, key) else {
            return Ok(None);
        };
        let next = arena[at].next;
        let index = alloc_node(&mut arena, value, next)?;
        arena[at].next = Some(index);
        Ok(Some(index))
    }

    /// Link a new node right before the first element equal to `key`.
    ///
    /// Returns `Ok(None)` without allocating if `key` is not present.
    pub fn insert_before(&mut self, key: &T, value: T) -> Result<Option<SlotIndex>, ListError> {
        let mut arena = self.arena.borrow_mut();
        let Some((prev, at)) = find_with_prev(&arena, self.head, key) else {
            return Ok(None);
        };
        let index = alloc_node(&mut arena, value, Some(at))?;
        match prev {
            None => self.head = Some(index),
            Some(p) => arena[p].next = Some(index),
        }
        Ok(Some(index))
    }

    /// Remove the first element equal to `value`. Returns false if none matched.
    pub fn remove_value(&mut self, value: &T) -> bool {
        let mut arena = self.arena.borrow_mut();
        let Some((prev, at)) = find_with_prev(&arena, self.head, value) else {
            return false;
        };
        unlink(&mut arena, &mut self.head, prev, at);
        arena.reclaim(at);
        true
    }

    /// Remove every element equal to `value`, returning how many were removed.
    pub fn remove_all_occurrences(&mut self, value: &T) -> usize {
        let mut arena = self.arena.borrow_mut();
        let mut removed = 0;
        let mut prev = None;
        let mut cur = self.head;
        while let Some(i) = cur {
            cur = arena[i].next;
            if arena[i].value == *value {
                unlink(&mut arena, &mut self.head, prev, i);
                arena.reclaim(i);
                removed += 1;
            } else {
                prev = Some(i);
            }
        }
        removed
    }

    /// Remove the element following the first occurrence of `key`.
    ///
    /// None if `key` is absent or is the last element.
    pub fn remove_after(&mut self, key: &T) -> Option<T> {
        let mut arena = self.arena.borrow_mut();
        let (_, at) = find_with_prev(&arena, self.head, key)?;
        let target = arena[at].next?;
        arena[at].next = arena[target].next;
        Some(arena.reclaim(target))
    }

    /// Remove the element preceding the first occurrence of `key`.
    ///
    /// None if `key` is absent or is the first element.
    pub fn remove_before(&mut self, key: &T) -> Option<T> {
        let mut arena = self.arena.borrow_mut();
        let mut before_prev = None;
        let mut prev = None;
        let mut cur = self.head;
        while let Some(i) = cur {
            if arena[i].value == *key {
                let target = prev?;
                unlink(&mut arena, &mut self.head, before_prev, target);
                return Some(arena.reclaim(target));
            }
            before_prev = prev;
            prev = cur;
            cur = arena[i].next;
        }
        None
    }

    /// Zero-based logical position of the first element equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        let arena = self.arena.borrow();
        let mut cur = self.head;
        let mut pos = 0;
        while let Some(i) = cur {
            if arena[i].value == *value {
                return Some(pos);
            }
            cur = arena[i].next;
            pos += 1;
        }
        None
    }

    /// Keep the first occurrence of each value, releasing later duplicates.
    ///
    /// Pairwise scan, O(n²) comparisons.
    pub fn remove_duplicates(&mut self) {
        let mut arena = self.arena.borrow_mut();
        let mut removed = 0usize;
        let mut outer = self.head;
        while let Some(i) = outer {
            let mut prev = i;
            let mut inner = arena[i].next;
            while let Some(j) = inner {
                inner = arena[j].next;
                if arena[j].value == arena[i].value {
                    arena[prev].next = inner;
                    arena.reclaim(j);
                    removed += 1;
                } else {
                    prev = j;
                }
            }
            outer = arena[i].next;
        }
        debug!(removed, "removed duplicates");
    }
}

impl<'a, T: Default + PartialOrd> IndexedList<'a, T> {
    /// Splice `value` in ahead of the first element that does not sort before it.
    ///
    /// Keeps an ascending list ascending; the result on an unsorted list is
    /// unspecified but still a valid chain.
    pub fn insert_sorted(&mut self, value: T) -> Result<SlotIndex, ListError> {
        self.insert_ordered(value, |new, existing| new < existing)
    }

    /// Descending counterpart of `insert_sorted`.
    pub fn insert_sorted_descending(&mut self, value: T) -> Result<SlotIndex, ListError> {
        self.insert_ordered(value, |new, existing| new > existing)
    }

    /// Insert before the first element `e` for which `goes_before(value, e)`.
    fn insert_ordered(
        &mut self,
        value: T,
        goes_before: impl Fn(&T, &T) -> bool,
    ) -> Result<SlotIndex, ListError> {
        let mut arena = self.arena.borrow_mut();

        let mut prev = match self.head {
            Some(h) if !goes_before(&value, &arena[h].value) => h,
            _ => {
                let index = alloc_node(&mut arena, value, self.head)?;
                self.head = Some(index);
                return Ok(index);
            }
        };
        while let Some(next) = arena[prev].next {
            if !goes_before(&arena[next].value, &value) {
                break;
            }
            prev = next;
        }
        let next = arena[prev].next;
        let index = alloc_node(&mut arena, value, next)?;
        arena[prev].next = Some(index);
        Ok(index)
    }

    /// Selection sort by swapping values between slots; links are untouched.
    pub fn sort_ascending(&mut self) {
        self.selection_sort(|candidate, current| candidate < current);
    }

    /// Descending counterpart of `sort_ascending`.
    pub fn sort_descending(&mut self) {
        self.selection_sort(|candidate, current| candidate > current);
    }

    fn selection_sort(&mut self, should_swap: impl Fn(&T, &T) -> bool) {
        let mut arena = self.arena.borrow_mut();
        let mut outer = self.head;
        while let Some(i) = outer {
            let mut inner = arena[i].next;
            while let Some(j) = inner {
                if should_swap(&arena[j].value, &arena[i].value) {
                    arena.swap_values(i, j);
                }
                inner = arena[j].next;
            }
            outer = arena[i].next;
        }
    }
}

impl<'a, T: Default + Clone> IndexedList<'a, T> {
    /// Copy the values out in logical order
    pub fn to_vec(&self) -> Vec<T> {
        let arena = self.arena.borrow();
        let mut out = Vec::new();
        let mut cur = self.head;
        while let Some(i) = cur {
            out.push(arena[i].value.clone());
            cur = arena[i].next;
        }
        out
    }

    /// Append copies of `rhs`'s values into freshly allocated slots (`+=`).
    ///
    /// The two lists never share slots afterwards. If the arena runs out
    /// midway, the values appended so far stay appended and `Exhausted` is
    /// returned.
    pub fn append_copy(&mut self, rhs: &IndexedList<'_, T>) -> Result<(), ListError> {
        let values = rhs.to_vec();
        let mut arena = self.arena.borrow_mut();
        let mut tail = tail_of(&arena, self.head);
        for value in values {
            let index = alloc_node(&mut arena, value, None)?;
            match tail {
                None => self.head = Some(index),
                Some(t) => arena[t].next = Some(index),
            }
            tail = Some(index);
        }
        Ok(())
    }

    /// Deep copy into new slots of the same arena.
    ///
    /// On `Exhausted` the partial copy is released again.
    pub fn try_clone(&self) -> Result<Self, ListError> {
        let mut copy = IndexedList::new(self.arena);
        copy.append_copy(self)?;
        Ok(copy)
    }

    /// Replace this list's contents with copies of `other`'s values.
    pub fn assign_from(&mut self, other: &IndexedList<'_, T>) -> Result<(), ListError> {
        self.clear();
        self.append_copy(other)
    }
}

/// Value-copy concatenation into a new list on the left operand's arena.
impl<'a, T: Default + Clone> Add<&IndexedList<'a, T>> for &IndexedList<'a, T> {
    type Output = Result<IndexedList<'a, T>, ListError>;

    fn add(self, rhs: &IndexedList<'a, T>) -> Self::Output {
        let mut result = self.try_clone()?;
        result.append_copy(rhs)?;
        Ok(result)
    }
}

impl<T: Default + fmt::Display> fmt::Display for IndexedList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        if self.head.is_none() {
            return write!(f, "[empty]");
        }
        write!(f, "[")?;
        let mut cur = self.head;
        while let Some(i) = cur {
            write!(f, "{}", arena[i].value)?;
            cur = arena[i].next;
            if cur.is_some() {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")
    }
}

impl<T: Default + fmt::Debug> fmt::Debug for IndexedList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        let mut list = f.debug_list();
        let mut cur = self.head;
        while let Some(i) = cur {
            list.entry(&arena[i].value);
            cur = arena[i].next;
        }
        list.finish()
    }
}

impl<T: Default> Drop for IndexedList<'_, T> {
    /// Returns every slot to the arena.
    ///
    /// # Panics
    ///
    /// If the arena is borrowed at the time (for example a live `get_at`
    /// guard), since the slots could not be returned. While already
    /// unwinding the slots are leaked instead of aborting on a double panic.
    fn drop(&mut self) {
        if self.arena.try_borrow_mut().is_ok() {
            self.clear();
        } else if self.head.is_some() {
            if std::thread::panicking() {
                warn!(head = ?self.head, "arena borrowed while unwinding, list slots leaked");
            } else {
                panic!("IndexedList dropped while its arena is borrowed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn list_of<'a>(arena: &'a RefCell<NodeArena<i32>>, values: &[i32]) -> IndexedList<'a, i32> {
        let mut list = IndexedList::new(arena);
        for &v in values {
            list.insert_back(v).unwrap();
        }
        list
    }

    #[test]
    fn test_insert_back_scenario() {
        let arena = NodeArena::shared(5);
        let mut list = IndexedList::new(&arena);
        list.insert_back("A".to_string()).unwrap();
        list.insert_back("B".to_string()).unwrap();
        list.insert_back("C".to_string()).unwrap();

        assert_eq!(list.to_vec(), strings(&["A", "B", "C"]));
        assert_eq!(list.to_string(), "[A, B, C]");
        assert_eq!(arena.borrow().used_count(), 3);
        assert_eq!(arena.borrow().free_count(), 2);
    }

    #[test]
    fn test_insert_front_and_head() {
        let arena = NodeArena::shared(4);
        let mut list = IndexedList::new(&arena);
        assert!(list.is_empty());
        let a = list.insert_front(1).unwrap();
        let b = list.insert_front(2).unwrap();
        assert_eq!(list.head(), Some(b));
        assert_eq!(list.slots(), vec![b, a]);
        assert_eq!(list.to_vec(), vec![2, 1]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_exhausted_then_delete_front_makes_room() {
        let arena = NodeArena::shared(2);
        let mut list = IndexedList::new(&arena);
        list.insert_back("X".to_string()).unwrap();
        list.insert_back("Y".to_string()).unwrap();

        let err = list.insert_back("Z".to_string()).unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(list.to_vec(), strings(&["X", "Y"]));

        assert_eq!(list.delete_front(), Some("X".to_string()));
        list.insert_back("Z".to_string()).unwrap();
        assert_eq!(list.to_vec(), strings(&["Y", "Z"]));
    }

    #[test]
    fn test_remove_after_and_before_scenario() {
        let arena = NodeArena::shared(5);
        let mut list = IndexedList::new(&arena);
        for v in ["A", "B", "C"] {
            list.insert_back(v.to_string()).unwrap();
        }

        assert_eq!(list.remove_after(&"A".to_string()), Some("B".to_string()));
        assert_eq!(list.to_vec(), strings(&["A", "C"]));

        assert_eq!(list.remove_before(&"C".to_string()), Some("A".to_string()));
        assert_eq!(list.to_vec(), strings(&["C"]));
        assert_eq!(arena.borrow().used_count(), 1);
    }

    #[test]
    fn test_remove_after_and_before_edges() {
        let arena = NodeArena::shared(5);
        let mut list = list_of(&arena, &[1, 2, 3]);
        assert_eq!(list.remove_after(&3), None);
        assert_eq!(list.remove_after(&9), None);
        assert_eq!(list.remove_before(&1), None);
        assert_eq!(list.remove_before(&9), None);
        assert_eq!(list.remove_before(&2), Some(1));
        assert_eq!(list.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_insert_after_and_before() {
        let arena = NodeArena::shared(6);
        let mut list = list_of(&arena, &[1, 3]);

        assert!(list.insert_after(&1, 2).unwrap().is_some());
        assert!(list.insert_after(&3, 4).unwrap().is_some());
        assert!(list.insert_before(&1, 0).unwrap().is_some());
        assert_eq!(list.to_vec(), vec![0, 1, 2, 3, 4]);

        assert_eq!(list.insert_after(&9, 5).unwrap(), None);
        assert_eq!(list.insert_before(&9, 5).unwrap(), None);
        assert_eq!(arena.borrow().used_count(), 5);
    }

    #[test]
    fn test_insert_before_missing_key_does_not_leak() {
        let arena = NodeArena::shared(3);
        let mut list: IndexedList<i32> = IndexedList::new(&arena);
        assert_eq!(list.insert_before(&1, 2).unwrap(), None);
        assert_eq!(arena.borrow().free_count(), 3);
    }

    #[test]
    fn test_insert_after_full_arena() {
        let arena = NodeArena::shared(2);
        let mut list = list_of(&arena, &[1, 2]);
        assert!(list.insert_after(&1, 5).unwrap_err().is_exhausted());
        assert_eq!(list.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_insert_at_position() {
        let arena = NodeArena::shared(6);
        let mut list = list_of(&arena, &[10, 30]);
        list.insert_at_position(1, 20).unwrap();
        list.insert_at_position(0, 0).unwrap();
        list.insert_at_position(4, 40).unwrap();
        assert_eq!(list.to_vec(), vec![0, 10, 20, 30, 40]);

        assert_eq!(
            list.insert_at_position(6, 99),
            Err(ListError::InvalidPosition {
                position: 6,
                len: 5
            })
        );
    }

    #[test]
    fn test_insert_at_slot_appends_logically() {
        let arena = NodeArena::shared(5);
        let mut list = list_of(&arena, &[1]);
        let target = SlotIndex::new(3);

        assert_eq!(list.insert_at_slot(target, 2), Ok(true));
        assert_eq!(list.to_vec(), vec![1, 2]);
        assert_eq!(list.slots(), vec![SlotIndex::new(0), target]);
        assert!(!arena.borrow().is_free(target));

        // Occupied slot is refused without side effects
        assert_eq!(list.insert_at_slot(target, 7), Ok(false));
        assert_eq!(list.to_vec(), vec![1, 2]);

        assert!(matches!(
            list.insert_at_slot(SlotIndex::new(5), 7),
            Err(ListError::Arena(ArenaError::IndexOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_insert_at_slot_into_empty_list() {
        let arena = NodeArena::shared(3);
        let mut list = IndexedList::new(&arena);
        assert_eq!(list.insert_at_slot(SlotIndex::new(2), 'x'), Ok(true));
        assert_eq!(list.head(), Some(SlotIndex::new(2)));
        // Next ordinary allocation still comes from the head of the free list
        assert_eq!(list.insert_back('y'), Ok(SlotIndex::new(0)));
    }

    #[test]
    fn test_insert_sorted_yields_non_decreasing() {
        let arena = NodeArena::shared(10);
        let mut list = IndexedList::new(&arena);
        for v in [5, 1, 4, 1, 9, 2, 6] {
            list.insert_sorted(v).unwrap();
        }
        assert_eq!(list.to_vec(), vec![1, 1, 2, 4, 5, 6, 9]);
    }

    #[test]
    fn test_insert_sorted_descending_yields_non_increasing() {
        let arena = NodeArena::shared(10);
        let mut list = IndexedList::new(&arena);
        for v in [5, 1, 4, 1, 9, 2, 6] {
            list.insert_sorted_descending(v).unwrap();
        }
        assert_eq!(list.to_vec(), vec![9, 6, 5, 4, 2, 1, 1]);
    }

    #[test]
    fn test_delete_front_and_back() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[1, 2, 3]);
        assert_eq!(list.delete_back(), Some(3));
        assert_eq!(list.delete_front(), Some(1));
        assert_eq!(list.delete_back(), Some(2));
        assert!(list.is_empty());
        assert_eq!(list.delete_front(), None);
        assert_eq!(list.delete_back(), None);
        assert_eq!(arena.borrow().free_count(), 4);
    }

    #[test]
    fn test_remove_slot() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[1, 2, 3]);

        assert_eq!(list.remove_slot(SlotIndex::new(1)), Some(2));
        assert_eq!(list.to_vec(), vec![1, 3]);
        assert_eq!(list.remove_slot(SlotIndex::new(1)), None);
        assert_eq!(list.remove_slot(SlotIndex::new(3)), None);
        assert_eq!(list.remove_slot(SlotIndex::new(40)), None);
        assert_eq!(list.remove_slot(SlotIndex::new(0)), Some(1));
        assert_eq!(list.to_vec(), vec![3]);
    }

    #[test]
    fn test_remove_slot_ignores_other_lists() {
        let arena = NodeArena::shared(4);
        let mut a = list_of(&arena, &[1]);
        let b = list_of(&arena, &[2]);
        let b_slot = b.slots()[0];
        assert_eq!(a.remove_slot(b_slot), None);
        assert_eq!(b.to_vec(), vec![2]);
    }

    #[test]
    fn test_remove_at_position() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[1, 2, 3]);
        assert_eq!(list.remove_at_position(1), Ok(2));
        assert_eq!(list.remove_at_position(0), Ok(1));
        assert_eq!(
            list.remove_at_position(1),
            Err(ListError::InvalidPosition {
                position: 1,
                len: 1
            })
        );
        assert_eq!(list.to_vec(), vec![3]);
    }

    #[test]
    fn test_remove_value_and_all_occurrences() {
        let arena = NodeArena::shared(8);
        let mut list = list_of(&arena, &[7, 1, 7, 2, 7]);
        assert!(list.remove_value(&7));
        assert_eq!(list.to_vec(), vec![1, 7, 2, 7]);
        assert!(!list.remove_value(&9));

        assert_eq!(list.remove_all_occurrences(&7), 2);
        assert_eq!(list.to_vec(), vec![1, 2]);
        assert_eq!(list.remove_all_occurrences(&7), 0);
        assert_eq!(arena.borrow().used_count(), 2);
    }

    #[test]
    fn test_remove_all_occurrences_every_element() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[3, 3, 3]);
        assert_eq!(list.remove_all_occurrences(&3), 3);
        assert!(list.is_empty());
        assert_eq!(arena.borrow().free_count(), 4);
    }

    #[test]
    fn test_find_and_get_at() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[4, 5, 6]);
        assert_eq!(list.find(&5), Some(1));
        assert_eq!(list.find(&8), None);

        assert_eq!(*list.get_at(2).unwrap(), 6);
        assert_eq!(
            list.get_at(3).unwrap_err(),
            ListError::InvalidPosition {
                position: 3,
                len: 3
            }
        );

        *list.get_at_mut(0).unwrap() = 40;
        assert_eq!(list.to_vec(), vec![40, 5, 6]);
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let arena = NodeArena::shared(5);
        let mut list = list_of(&arena, &[1, 2, 3, 4]);
        let slots = list.slots();
        list.reverse();
        assert_eq!(list.to_vec(), vec![4, 3, 2, 1]);
        assert_eq!(list.head(), slots.last().copied());
        list.reverse();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(list.slots(), slots);
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let arena = NodeArena::shared(8);
        let mut list = list_of(&arena, &[1, 2, 1, 3, 2, 2, 4]);
        list.remove_duplicates();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(arena.borrow().used_count(), 4);
        list.remove_duplicates();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let arena = NodeArena::shared(4);
        let mut list = list_of(&arena, &[3, 1, 2]);
        let slots = list.slots();
        list.sort_ascending();
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        // Values move, nodes stay put
        assert_eq!(list.slots(), slots);
        list.sort_descending();
        assert_eq!(list.to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_append_copy_shares_no_slots() {
        let arena = NodeArena::shared(6);
        let mut a = list_of(&arena, &[1, 2]);
        let b = list_of(&arena, &[3, 4]);
        a.append_copy(&b).unwrap();
        assert_eq!(a.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(b.to_vec(), vec![3, 4]);
        assert!(a.slots().iter().all(|s| !b.slots().contains(s)));
        assert_eq!(arena.borrow().used_count(), 6);
    }

    #[test]
    fn test_append_copy_partial_on_exhaustion() {
        let arena = NodeArena::shared(4);
        let mut a = list_of(&arena, &[1]);
        let b = list_of(&arena, &[2, 3]);
        assert!(a.append_copy(&b).unwrap_err().is_exhausted());
        assert_eq!(a.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_add_builds_independent_list() {
        let arena = NodeArena::shared(8);
        let a = list_of(&arena, &[1, 2]);
        let b = list_of(&arena, &[3]);
        let c = (&a + &b).unwrap();
        assert_eq!(c.to_vec(), vec![1, 2, 3]);
        assert_eq!(arena.borrow().used_count(), 6);
        drop(c);
        assert_eq!(arena.borrow().used_count(), 3);
    }

    #[test]
    fn test_add_exhausted_releases_partial_result() {
        let arena = NodeArena::shared(5);
        let a = list_of(&arena, &[1, 2]);
        let b = list_of(&arena, &[3, 4]);
        assert!((&a + &b).unwrap_err().is_exhausted());
        assert_eq!(arena.borrow().used_count(), 4);
    }

    #[test]
    fn test_append_from_other_arena() {
        let left = NodeArena::shared(4);
        let right = NodeArena::shared(4);
        let mut a = list_of(&left, &[1]);
        let b = list_of(&right, &[2, 3]);
        a.append_copy(&b).unwrap();
        assert_eq!(a.to_vec(), vec![1, 2, 3]);
        assert_eq!(left.borrow().used_count(), 3);
        assert_eq!(right.borrow().used_count(), 2);
    }

    #[test]
    fn test_try_clone_and_assign_from() {
        let arena = NodeArena::shared(8);
        let a = list_of(&arena, &[1, 2]);
        let copy = a.try_clone().unwrap();
        assert_eq!(copy.to_vec(), vec![1, 2]);
        assert_ne!(copy.slots(), a.slots());

        let mut target = list_of(&arena, &[9, 9, 9]);
        target.assign_from(&a).unwrap();
        assert_eq!(target.to_vec(), vec![1, 2]);
        assert_eq!(arena.borrow().used_count(), 6);
    }

    #[test]
    fn test_clear_returns_every_slot() {
        let arena = NodeArena::shared(5);
        let mut list = list_of(&arena, &[1, 2, 3]);
        let keep = list_of(&arena, &[4]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(arena.borrow().free_count(), 4);
        assert_eq!(keep.to_vec(), vec![4]);
        assert!(arena.borrow().check_integrity());
    }

    #[test]
    fn test_drop_releases_slots() {
        let arena = NodeArena::shared(3);
        {
            let _list = list_of(&arena, &[1, 2, 3]);
            assert_eq!(arena.borrow().free_count(), 0);
        }
        assert_eq!(arena.borrow().free_count(), 3);
    }

    #[test]
    #[should_panic(expected = "IndexedList dropped while its arena is borrowed")]
    fn test_drop_with_live_guard_panics() {
        let arena = NodeArena::shared(4);
        let a = list_of(&arena, &[1]);
        let b = list_of(&arena, &[2, 3]);
        let first = a.get_at(0).unwrap();
        drop(b);
        drop(first);
    }

    #[test]
    fn test_drop_after_guard_released_returns_slots() {
        let arena = NodeArena::shared(4);
        let a = list_of(&arena, &[1]);
        let b = list_of(&arena, &[2, 3]);
        {
            let first = a.get_at(0).unwrap();
            assert_eq!(*first, 1);
        }
        drop(b);
        assert_eq!(arena.borrow().used_count(), 1);
        assert!(arena.borrow().check_integrity());
    }

    #[test]
    fn test_drop_empty_list_with_live_guard() {
        let arena = NodeArena::shared(2);
        let a = list_of(&arena, &[1]);
        let empty: IndexedList<i32> = IndexedList::new(&arena);
        let first = a.get_at(0).unwrap();
        // Nothing to release, so the borrow does not matter
        drop(empty);
        assert_eq!(*first, 1);
    }

    #[test]
    fn test_display_and_debug() {
        let arena = NodeArena::shared(3);
        let mut list = IndexedList::new(&arena);
        assert_eq!(list.to_string(), "[empty]");
        list.insert_back(1).unwrap();
        list.insert_back(2).unwrap();
        assert_eq!(list.to_string(), "[1, 2]");
        assert_eq!(format!("{:?}", list), "[1, 2]");
    }
}
