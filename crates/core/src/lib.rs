//! Slotlist: singly linked lists stored in a fixed-capacity node arena
//!
//! Nodes never live on the general heap. A `NodeArena` owns a fixed array
//! of slots and hands them out through a free-list allocator; an
//! `IndexedList` is nothing more than the index of its head slot, and every
//! list operation is a walk or rewrite of `next` links inside the arena.
//!
//! # Modules
//!
//! - `index`: `SlotIndex` addressing and the `Slot` record
//! - `arena`: `NodeArena`, the free-list allocator, and `ArenaStats`
//! - `list`: `IndexedList` and all positional/ordering algorithms
//! - `error`: `ArenaError` and `ListError`
//!
//! # Example
//!
//! ```
//! use slotlist::{IndexedList, NodeArena};
//!
//! let arena = NodeArena::shared(5);
//! let mut list = IndexedList::new(&arena);
//! list.insert_back("A".to_string()).unwrap();
//! list.insert_back("B".to_string()).unwrap();
//! list.insert_front("Z".to_string()).unwrap();
//!
//! assert_eq!(list.to_string(), "[Z, A, B]");
//! assert_eq!(arena.borrow().free_count(), 2);
//! ```

pub mod arena;
pub mod error;
pub mod index;
pub mod list;

pub use arena::{ArenaStats, NodeArena};
pub use error::{ArenaError, ListError};
pub use index::{Slot, SlotIndex};
pub use list::IndexedList;
