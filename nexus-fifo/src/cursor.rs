//! Cursor integer widths.
//!
//! Cursors never exceed the queue's capacity, so any unsigned integer wide
//! enough to hold `capacity` can back them. Narrow cursors are useful when
//! the queue lives in a size-constrained layout or when the capacity is known
//! to be small.
//!
//! | Cursor  | Max capacity          |
//! |---------|-----------------------|
//! | `u8`    | 255                   |
//! | `u16`   | 65 535                |
//! | `u32`   | 4 294 967 295         |
//! | `u64`   | `usize::MAX - 1`      |
//! | `usize` | `usize::MAX - 1`      |
//!
//! The last slot index is `capacity`, and the sentinel slot means the buffer
//! holds `capacity + 1` elements, which is why `usize::MAX` itself is never a
//! valid capacity.

use std::fmt;

use crate::sync::{AtomicU8, AtomicU16, AtomicU32, AtomicUsize, Ordering};

#[cfg(target_has_atomic = "64")]
use crate::sync::AtomicU64;

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer type usable as a queue cursor.
///
/// This trait is sealed. Cursor values cross the API as `usize`; the
/// narrow type only determines the width of the shared atomics.
pub trait Cursor: sealed::Sealed + Copy + fmt::Debug + Send + Sync + 'static {
    /// Atomic cell holding a cursor of this width.
    #[doc(hidden)]
    type Atomic: Send + Sync;

    /// Largest cursor value representable by this type.
    const MAX: usize;

    #[doc(hidden)]
    fn atomic(value: usize) -> Self::Atomic;

    #[doc(hidden)]
    fn load(atomic: &Self::Atomic, order: Ordering) -> usize;

    #[doc(hidden)]
    fn store(atomic: &Self::Atomic, value: usize, order: Ordering);
}

macro_rules! impl_cursor {
    ($($(#[$meta:meta])* $int:ty => $atomic:ident),* $(,)?) => {$(
        $(#[$meta])*
        impl sealed::Sealed for $int {}

        $(#[$meta])*
        #[allow(clippy::cast_possible_truncation)]
        impl Cursor for $int {
            type Atomic = $atomic;

            const MAX: usize = if <$int>::BITS >= usize::BITS {
                usize::MAX
            } else {
                <$int>::MAX as usize
            };

            #[inline(always)]
            fn atomic(value: usize) -> Self::Atomic {
                debug_assert!(value <= <Self as Cursor>::MAX);
                $atomic::new(value as $int)
            }

            #[inline(always)]
            fn load(atomic: &Self::Atomic, order: Ordering) -> usize {
                atomic.load(order) as usize
            }

            #[inline(always)]
            fn store(atomic: &Self::Atomic, value: usize, order: Ordering) {
                debug_assert!(value <= <Self as Cursor>::MAX);
                atomic.store(value as $int, order);
            }
        }
    )*};
}

impl_cursor! {
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    #[cfg(target_has_atomic = "64")]
    u64 => AtomicU64,
    usize => AtomicUsize,
}
