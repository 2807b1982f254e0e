//! Error types for queue construction and push.

use std::fmt;

/// Error returned when the queue is full.
///
/// Contains the value that could not be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// The requested capacity cannot back a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// A queue must hold at least one element.
    Zero,
    /// Capacity is larger than the cursor type can index.
    CursorOverflow {
        /// Requested capacity.
        capacity: usize,
        /// Largest capacity the cursor type supports.
        max: usize,
    },
    /// The `capacity + 1` slot array does not fit in the address space.
    TooLarge {
        /// Requested capacity.
        capacity: usize,
    },
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "capacity must be non-zero"),
            Self::CursorOverflow { capacity, max } => {
                write!(f, "capacity {capacity} exceeds cursor max {max}")
            }
            Self::TooLarge { capacity } => {
                write!(f, "capacity {capacity} exceeds addressable slot storage")
            }
        }
    }
}

impl std::error::Error for CapacityError {}
