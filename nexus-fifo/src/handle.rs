//! Producer and consumer handles for cross-thread use.
//!
//! There is exactly one of each handle per queue, and `push`/`pop` take
//! `&mut self`, so safe code cannot end up with two producers or two
//! consumers. Handles are `Send` when `T` is.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! let (mut producer, mut consumer) = nexus_fifo::ring_buffer::<u64>(64);
//!
//! let handle = thread::spawn(move || {
//!     for i in 0..1_000 {
//!         while producer.push(i).is_err() {
//!             std::hint::spin_loop();
//!         }
//!     }
//! });
//!
//! let mut expected = 0;
//! while expected < 1_000 {
//!     if let Some(v) = consumer.pop() {
//!         assert_eq!(v, expected);
//!         expected += 1;
//!     }
//! }
//! handle.join().unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use allocator_api2::alloc::{Allocator, Global};

use crate::cursor::Cursor;
use crate::{Fifo, Full};

/// Creates a queue holding up to `capacity` elements and splits it.
///
/// Remaining elements are leaked when both handles are gone; build the queue
/// with [`Fifo::with_config`] and [`Fifo::split`] to choose otherwise.
///
/// # Panics
///
/// Panics if `capacity` is 0.
///
/// # Example
///
/// ```
/// let (mut producer, mut consumer) = nexus_fifo::ring_buffer::<u32>(2);
///
/// assert!(producer.push(1).is_ok());
/// assert!(producer.push(2).is_ok());
/// assert!(producer.push(3).is_err()); // Full
///
/// assert_eq!(consumer.pop(), Some(1));
/// ```
pub fn ring_buffer<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    Fifo::new(capacity).split()
}

impl<T, C: Cursor, A: Allocator> Fifo<T, C, A> {
    /// Splits the queue into its producer and consumer halves.
    ///
    /// The queue is freed, subject to its [`DropPolicy`] and by its own
    /// allocator, once both halves are dropped.
    ///
    /// [`DropPolicy`]: crate::DropPolicy
    pub fn split(self) -> (Producer<T, C, A>, Consumer<T, C, A>) {
        let fifo = Arc::new(self);
        (
            Producer {
                fifo: Arc::clone(&fifo),
            },
            Consumer { fifo },
        )
    }
}

/// The producer half of a [`Fifo`].
pub struct Producer<T, C: Cursor = usize, A: Allocator = Global> {
    fifo: Arc<Fifo<T, C, A>>,
}

impl<T, C: Cursor, A: Allocator> Producer<T, C, A> {
    /// Attempts to push a value onto the queue.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the queue is full, giving the value back.
    #[inline]
    #[must_use = "push returns Err if full, which should be handled"]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        // SAFETY: this handle is the only producer and `&mut self` keeps it
        // from being used re-entrantly.
        unsafe { self.fifo.enqueue(value) }
    }

    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    /// Returns the number of elements in the queue.
    ///
    /// The consumer may pop concurrently, so this can only over-estimate.
    #[inline]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// Returns `true` if the queue appears empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Returns `true` if the queue appears full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    /// Returns `true` if the consumer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.fifo) == 1
    }
}

impl<T, C: Cursor, A: Allocator> fmt::Debug for Producer<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// The consumer half of a [`Fifo`].
pub struct Consumer<T, C: Cursor = usize, A: Allocator = Global> {
    fifo: Arc<Fifo<T, C, A>>,
}

impl<T, C: Cursor, A: Allocator> Consumer<T, C, A> {
    /// Attempts to pop a value from the queue.
    ///
    /// Returns `None` if the queue is empty. Values come out in push order.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: this handle is the only consumer and `&mut self` keeps it
        // from being used re-entrantly.
        unsafe { self.fifo.dequeue() }
    }

    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    /// Returns the number of elements in the queue.
    ///
    /// The producer may push concurrently, so this can only under-estimate.
    #[inline]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// Returns `true` if the queue appears empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Returns `true` if the queue appears full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    /// Returns `true` if the producer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.fifo) == 1
    }
}

impl<T, C: Cursor, A: Allocator> fmt::Debug for Consumer<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
