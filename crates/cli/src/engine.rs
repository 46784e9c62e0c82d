//! Script engine
//!
//! Runs parsed commands against one shared `NodeArena<String>` and any
//! number of named `IndexedList`s. The engine owns the "arena is full"
//! recovery that the list layer deliberately leaves to its caller: with an
//! eviction policy other than `none`, an insert that fails with `Exhausted`
//! drops one element from the target list and is retried exactly once.
//! The policy picks the end to evict from; if that element is the key of an
//! `insert-after`/`insert-before`, or removing it would push an `insert-at`
//! position past the end, the other end is used, and when neither works
//! nothing is evicted.
//!
//! Lists are created by the first insert that names them. Reading or
//! removing from an unknown list behaves as if it were empty.
//!
//! "Not found" outcomes are printed and the script continues. Invalid
//! positions, out-of-range slots and unrecovered exhaustion stop the run.

use crate::config::EvictionPolicy;
use crate::report::{ListReport, Report};
use crate::script::{Command, ScriptLine};
use slotlist::{IndexedList, ListError, NodeArena, SlotIndex};
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct Engine<'a> {
    arena: &'a RefCell<NodeArena<String>>,
    lists: BTreeMap<String, IndexedList<'a, String>>,
    eviction: EvictionPolicy,
    commands: usize,
    evictions: usize,
}

/// Position error for a list that was never created
fn missing_position(position: usize) -> ListError {
    ListError::InvalidPosition { position, len: 0 }
}

fn format_slots(slots: &[SlotIndex]) -> String {
    let parts: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// What a retried insert relies on after one element is evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Needs {
    /// Any element may go
    Nothing,
    /// The element at this logical position is the insert's key
    Anchor(usize),
    /// The list must still be at least this long
    Length(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

impl Needs {
    fn allows(self, end: End, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        match self {
            Needs::Nothing => true,
            Needs::Anchor(pos) => match end {
                End::Front => pos != 0,
                End::Back => pos + 1 != len,
            },
            Needs::Length(min) => len > min,
        }
    }
}

/// End to evict from: the policy's end first, then the other one.
fn eviction_end(policy: EvictionPolicy, len: usize, needs: Needs) -> Option<End> {
    let order = match policy {
        EvictionPolicy::None => return None,
        EvictionPolicy::Front => [End::Front, End::Back],
        EvictionPolicy::Back => [End::Back, End::Front],
    };
    order.into_iter().find(|&end| needs.allows(end, len))
}

impl<'a> Engine<'a> {
    pub fn new(arena: &'a RefCell<NodeArena<String>>, eviction: EvictionPolicy) -> Self {
        Engine {
            arena,
            lists: BTreeMap::new(),
            eviction,
            commands: 0,
            evictions: 0,
        }
    }

    /// Named list, created empty on first use
    fn list_mut(&mut self, name: &str) -> &mut IndexedList<'a, String> {
        let arena = self.arena;
        self.lists
            .entry(name.to_string())
            .or_insert_with(|| IndexedList::new(arena))
    }

    /// Run an insert, evicting from the same list and retrying once on exhaustion.
    ///
    /// `needs` says what the retry depends on, so the evicted element is
    /// never the insert's anchor and the retry is never doomed. When neither
    /// end can go, the original `Exhausted` error is returned untouched.
    fn insert_with_recovery<R>(
        &mut self,
        name: &str,
        needs: impl Fn(&IndexedList<'a, String>) -> Needs,
        op: impl Fn(&mut IndexedList<'a, String>) -> Result<R, ListError>,
    ) -> Result<R, ListError> {
        let eviction = self.eviction;
        let list = self.list_mut(name);
        let err = match op(list) {
            Err(e) if e.is_exhausted() => e,
            other => return other,
        };

        let Some(end) = eviction_end(eviction, list.len(), needs(&*list)) else {
            debug!(list = name, ?eviction, "arena full and no element can be evicted");
            return Err(err);
        };
        let evicted = match end {
            End::Front => list.delete_front(),
            End::Back => list.delete_back(),
        };
        let Some(evicted) = evicted else {
            return Err(err);
        };

        info!(list = name, %evicted, ?end, "arena full, evicted element and retrying");
        let retried = op(list);
        self.evictions += 1;
        retried
    }

    /// Concatenate `src` onto `dst` by value copy.
    fn concat(&mut self, dst: &str, src: &str) -> Result<(), ListError> {
        if dst != src && self.eviction == EvictionPolicy::None {
            let arena = self.arena;
            let mut target = self
                .lists
                .remove(dst)
                .unwrap_or_else(|| IndexedList::new(arena));
            let outcome = match self.lists.get(src) {
                Some(source) => target.append_copy(source),
                None => Ok(()),
            };
            self.lists.insert(dst.to_string(), target);
            return outcome;
        }

        // Self-concatenation, or per-element recovery: copy from a snapshot
        let values = self.lists.get(src).map(|l| l.to_vec()).unwrap_or_default();
        for value in values {
            self.insert_with_recovery(
                dst,
                |_| Needs::Nothing,
                |l| l.insert_back(value.clone()),
            )?;
        }
        Ok(())
    }

    /// Execute one command, returning the line to print (if any).
    pub fn execute(&mut self, command: &Command) -> Result<Option<String>, ListError> {
        debug!(?command, "execute");
        self.commands += 1;

        let message = match command {
            Command::PushFront { list, value } => {
                let slot = self.insert_with_recovery(
                    list,
                    |_| Needs::Nothing,
                    |l| l.insert_front(value.clone()),
                )?;
                format!("inserted at slot {}", slot)
            }
            Command::PushBack { list, value } => {
                let slot = self.insert_with_recovery(
                    list,
                    |_| Needs::Nothing,
                    |l| l.insert_back(value.clone()),
                )?;
                format!("inserted at slot {}", slot)
            }
            Command::InsertAfter { list, key, value } => {
                let inserted = self.insert_with_recovery(
                    list,
                    |l| l.find(key).map_or(Needs::Nothing, Needs::Anchor),
                    |l| l.insert_after(key, value.clone()),
                )?;
                match inserted {
                    Some(slot) => format!("inserted at slot {}", slot),
                    None => format!("key '{}' not found", key),
                }
            }
            Command::InsertBefore { list, key, value } => {
                let inserted = self.insert_with_recovery(
                    list,
                    |l| l.find(key).map_or(Needs::Nothing, Needs::Anchor),
                    |l| l.insert_before(key, value.clone()),
                )?;
                match inserted {
                    Some(slot) => format!("inserted at slot {}", slot),
                    None => format!("key '{}' not found", key),
                }
            }
            Command::InsertAt { list, pos, value } => {
                let slot = self.insert_with_recovery(
                    list,
                    |_| Needs::Length(*pos),
                    |l| l.insert_at_position(*pos, value.clone()),
                )?;
                format!("inserted at slot {}", slot)
            }
            Command::InsertSlot { list, slot, value } => {
                let slot = SlotIndex::new(*slot);
                let eviction = self.eviction;
                let full = self.arena.borrow().free_count() == 0;
                let target = self.list_mut(list);
                let mut placed = target.insert_at_slot(slot, value.clone())?;
                // A full arena can only make room at that slot if this list holds it
                let evicted = match (placed, full, eviction) {
                    (false, true, EvictionPolicy::Front | EvictionPolicy::Back) => {
                        target.remove_slot(slot)
                    }
                    _ => None,
                };
                if let Some(evicted) = evicted {
                    info!(list = %list, %slot, %evicted, "evicted slot occupant and retrying");
                    placed = target.insert_at_slot(slot, value.clone())?;
                    self.evictions += 1;
                }
                if placed {
                    format!("inserted at slot {}", slot)
                } else {
                    format!("slot {} is occupied", slot)
                }
            }
            Command::InsertSorted { list, value } => {
                let slot = self.insert_with_recovery(
                    list,
                    |_| Needs::Nothing,
                    |l| l.insert_sorted(value.clone()),
                )?;
                format!("inserted at slot {}", slot)
            }
            Command::InsertSortedDesc { list, value } => {
                let slot = self.insert_with_recovery(
                    list,
                    |_| Needs::Nothing,
                    |l| l.insert_sorted_descending(value.clone()),
                )?;
                format!("inserted at slot {}", slot)
            }
            Command::PopFront { list } => {
                match self.lists.get_mut(list).and_then(|l| l.delete_front()) {
                    Some(value) => format!("removed '{}'", value),
                    None => "list is empty".to_string(),
                }
            }
            Command::PopBack { list } => {
                match self.lists.get_mut(list).and_then(|l| l.delete_back()) {
                    Some(value) => format!("removed '{}'", value),
                    None => "list is empty".to_string(),
                }
            }
            Command::Remove { list, value } => {
                if self.lists.get_mut(list).is_some_and(|l| l.remove_value(value)) {
                    format!("removed '{}'", value)
                } else {
                    format!("value '{}' not found", value)
                }
            }
            Command::RemoveAll { list, value } => {
                let removed = self
                    .lists
                    .get_mut(list)
                    .map_or(0, |l| l.remove_all_occurrences(value));
                format!("removed {} occurrence(s) of '{}'", removed, value)
            }
            Command::RemoveAfter { list, key } => {
                match self.lists.get_mut(list).and_then(|l| l.remove_after(key)) {
                    Some(value) => format!("removed '{}'", value),
                    None => format!("nothing after '{}'", key),
                }
            }
            Command::RemoveBefore { list, key } => {
                match self.lists.get_mut(list).and_then(|l| l.remove_before(key)) {
                    Some(value) => format!("removed '{}'", value),
                    None => format!("nothing before '{}'", key),
                }
            }
            Command::RemoveSlot { list, slot } => {
                let slot = SlotIndex::new(*slot);
                match self.lists.get_mut(list).and_then(|l| l.remove_slot(slot)) {
                    Some(value) => format!("removed '{}'", value),
                    None => format!("slot {} is not in list '{}'", slot, list),
                }
            }
            Command::RemoveAt { list, pos } => {
                let value = match self.lists.get_mut(list) {
                    Some(l) => l.remove_at_position(*pos)?,
                    None => return Err(missing_position(*pos)),
                };
                format!("removed '{}'", value)
            }
            Command::Find { list, value } => {
                match self.lists.get(list).and_then(|l| l.find(value)) {
                    Some(pos) => format!("found at position {}", pos),
                    None => format!("value '{}' not found", value),
                }
            }
            Command::Get { list, pos } => match self.lists.get(list) {
                Some(l) => l.get_at(*pos)?.clone(),
                None => return Err(missing_position(*pos)),
            },
            Command::Reverse { list } => {
                if let Some(l) = self.lists.get_mut(list) {
                    l.reverse();
                }
                return Ok(None);
            }
            Command::Dedup { list } => {
                if let Some(l) = self.lists.get_mut(list) {
                    l.remove_duplicates();
                }
                return Ok(None);
            }
            Command::Sort { list } => {
                if let Some(l) = self.lists.get_mut(list) {
                    l.sort_ascending();
                }
                return Ok(None);
            }
            Command::SortDesc { list } => {
                if let Some(l) = self.lists.get_mut(list) {
                    l.sort_descending();
                }
                return Ok(None);
            }
            Command::Concat { dst, src } => {
                self.concat(dst, src)?;
                return Ok(None);
            }
            Command::Clear { list } => {
                if let Some(l) = self.lists.get_mut(list) {
                    l.clear();
                }
                return Ok(None);
            }
            Command::Print { list } => match self.lists.get(list) {
                Some(l) => l.to_string(),
                None => "[empty]".to_string(),
            },
            Command::Size { list } => self.lists.get(list).map_or(0, |l| l.len()).to_string(),
            Command::Free => format_slots(&self.arena.borrow().free_indices()),
            Command::Used => format_slots(&self.arena.borrow().used_indices()),
        };
        Ok(Some(message))
    }

    /// Run a whole script, passing printed lines to `emit`.
    ///
    /// Stops at the first failing command and reports its line.
    pub fn run(
        &mut self,
        script: &[ScriptLine],
        mut emit: impl FnMut(String),
    ) -> Result<(), String> {
        for line in script {
            match self.execute(&line.command) {
                Ok(Some(message)) => emit(message),
                Ok(None) => {}
                Err(e) => return Err(format!("line {}: {}", line.line, e)),
            }
        }
        Ok(())
    }

    /// Contents of a named list, if it exists
    pub fn values(&self, name: &str) -> Option<Vec<String>> {
        self.lists.get(name).map(|l| l.to_vec())
    }

    pub fn report(&self) -> Report {
        let arena = self.arena.borrow();
        let stats = arena.stats();
        let free_slots = arena.free_indices();
        drop(arena);

        let lists = self
            .lists
            .iter()
            .map(|(name, list)| {
                (
                    name.clone(),
                    ListReport {
                        values: list.to_vec(),
                        slots: list.slots(),
                    },
                )
            })
            .collect();

        Report {
            arena: stats,
            free_slots,
            lists,
            commands: self.commands,
            evictions: self.evictions,
        }
    }
}
