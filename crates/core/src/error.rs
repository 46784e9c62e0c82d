//! Arena and list error types
//!
//! Two layers of failure:
//!
//! - `ArenaError`: slot-level failures raised by `NodeArena` (bad index,
//!   no free slot, releasing a slot that is already free).
//! - `ListError`: list-level failures raised by `IndexedList`, which wraps
//!   any arena failure and adds logical-position errors.
//!
//! A key or value that is simply not present is not an error; list
//! operations report it through `Option` or `bool`.

use crate::index::SlotIndex;

/// Error type for slot allocation and access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// A slot index outside `[0, capacity)`
    IndexOutOfRange { index: SlotIndex, capacity: usize },
    /// No free slot is left in the arena
    Exhausted { capacity: usize },
    /// A slot was released while already on the free list
    DoubleRelease { index: SlotIndex },
}

impl std::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArenaError::IndexOutOfRange { index, capacity } => {
                write!(
                    f,
                    "slot index {} out of range for arena of capacity {}",
                    index, capacity
                )
            }
            ArenaError::Exhausted { capacity } => {
                write!(f, "node arena exhausted: all {} slots in use", capacity)
            }
            ArenaError::DoubleRelease { index } => {
                write!(f, "slot {} released while already free", index)
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// Error type for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// The underlying arena rejected the request
    Arena(ArenaError),
    /// A logical position outside the list's valid range
    InvalidPosition { position: usize, len: usize },
}

impl ListError {
    /// True if the failure was caused by a full arena.
    ///
    /// Callers use this to decide whether evicting an element and retrying
    /// can make the operation succeed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ListError::Arena(ArenaError::Exhausted { .. }))
    }
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListError::Arena(e) => write!(f, "{}", e),
            ListError::InvalidPosition { position, len } => {
                write!(f, "position {} is invalid for list of length {}", position, len)
            }
        }
    }
}

impl std::error::Error for ListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListError::Arena(e) => Some(e),
            ListError::InvalidPosition { .. } => None,
        }
    }
}

impl From<ArenaError> for ListError {
    fn from(e: ArenaError) -> Self {
        ListError::Arena(e)
    }
}
