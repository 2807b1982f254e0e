//! Construction-time queue configuration.

use std::alloc::Layout;

use allocator_api2::alloc::Allocator;

use crate::cursor::Cursor;
use crate::{CapacityError, Fifo};

/// What happens to elements still in the queue when it is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropPolicy {
    /// Release the storage without running destructors of remaining elements.
    ///
    /// Remaining elements are leaked. This is memory safe but any resources
    /// they own are never reclaimed, and side-effecting `Drop` impls never run.
    /// Drain the queue before dropping it if that matters.
    #[default]
    Leak,
    /// Drop remaining elements in FIFO order, then release the storage.
    DropRemaining,
}

/// Queue configuration.
///
/// # Example
///
/// ```
/// use nexus_fifo::{Config, DropPolicy, Fifo};
///
/// let config = Config::new(64).with_drop_policy(DropPolicy::DropRemaining);
/// let fifo = Fifo::<String>::with_config(config);
/// assert_eq!(fifo.capacity(), 64);
///
/// let narrow = Config::new(200).build::<u64, u8>();
/// assert_eq!(narrow.capacity(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    capacity: usize,
    drop_policy: DropPolicy,
}

impl Config {
    /// Creates a configuration for a queue holding up to `capacity` elements.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            drop_policy: DropPolicy::Leak,
        }
    }

    /// Sets the policy applied to remaining elements on drop.
    #[must_use]
    pub const fn with_drop_policy(mut self, drop_policy: DropPolicy) -> Self {
        self.drop_policy = drop_policy;
        self
    }

    /// Maximum number of elements the queue holds at once.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Policy applied to remaining elements on drop.
    pub const fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    /// Builds a queue of `T` with cursor type `C`.
    ///
    /// # Panics
    ///
    /// Panics if [`validate`](Self::validate) rejects the configuration.
    pub fn build<T, C: Cursor>(self) -> Fifo<T, C> {
        Fifo::with_config(self)
    }

    /// Fallible version of [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_build<T, C: Cursor>(self) -> Result<Fifo<T, C>, CapacityError> {
        Fifo::try_with_config(self)
    }

    /// Builds a queue of `T` with cursor type `C` in storage from `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if [`validate`](Self::validate) rejects the configuration.
    pub fn build_in<T, C: Cursor, A: Allocator>(self, alloc: A) -> Fifo<T, C, A> {
        Fifo::with_config_in(self, alloc)
    }

    /// Fallible version of [`build_in`](Self::build_in).
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_build_in<T, C: Cursor, A: Allocator>(
        self,
        alloc: A,
    ) -> Result<Fifo<T, C, A>, CapacityError> {
        Fifo::try_with_config_in(self, alloc)
    }

    /// Checks that a queue of `T` with cursor `C` can be built from this config.
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn validate<T, C: Cursor>(&self) -> Result<(), CapacityError> {
        let capacity = self.capacity;
        if capacity == 0 {
            return Err(CapacityError::Zero);
        }
        if capacity > C::MAX {
            return Err(CapacityError::CursorOverflow {
                capacity,
                max: C::MAX,
            });
        }
        let slots = capacity
            .checked_add(1)
            .ok_or(CapacityError::TooLarge { capacity })?;
        Layout::array::<T>(slots).map_err(|_| CapacityError::TooLarge { capacity })?;
        Ok(())
    }
}
