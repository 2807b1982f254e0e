//! The bounded SPSC ring with constrained cursors.
//!
//! # Cursor protocol
//!
//! Both cursors live in `[0, capacity]` and index a buffer of `capacity + 1`
//! slots. The extra sentinel slot is what separates the two boundary states
//! without a counter:
//!
//! ```text
//! empty:  push == pop
//! full:   push <  pop  =>  push == pop - 1
//!         pop  <  push =>  push - pop == capacity
//! ```
//!
//! No computation on a cursor ever leaves `[0, capacity]` or goes negative,
//! which is what allows narrow [`Cursor`] types.
//!
//! # Memory layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ buffer, capacity, drop policy (read-only)            │
//! ├──────────────────────────────────────────────────────┤
//! │ push_cursor        - stored by producer              │
//! ├──────────────────────────────────────────────────────┤
//! │ pop_cursor_cached  - producer only                   │
//! ├──────────────────────────────────────────────────────┤
//! │ pop_cursor         - stored by consumer              │
//! ├──────────────────────────────────────────────────────┤
//! │ push_cursor_cached - consumer only                   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Each row after the header starts on its own [`CACHE_LINE`] boundary and
//! the struct is padded out to a full line at the end.
//!
//! # Ordering
//!
//! ```text
//! producer writes slot, Release-stores push_cursor  ->  consumer Acquire-loads push_cursor, reads slot
//! consumer reads slot,  Release-stores pop_cursor   ->  producer Acquire-loads pop_cursor, writes slot
//! ```
//!
//! The Acquire loads only happen when the cached snapshot says the operation
//! cannot proceed.

use std::alloc::{Layout, handle_alloc_error};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{Allocator, Global};
use crossbeam_utils::CachePadded;

use crate::config::{Config, DropPolicy};
use crate::cursor::Cursor;
use crate::sync::{Ordering, UnsafeCell};
use crate::trace::{debug, trace};
use crate::{CapacityError, Full};

/// Alignment used to keep producer-owned and consumer-owned state apart.
///
/// Taken from [`CachePadded`], which picks the destructive interference size
/// of the target (128 bytes on x86-64 and aarch64, 64 on most others).
pub const CACHE_LINE: usize = mem::align_of::<CachePadded<u8>>();

enum ProducerSide {}
enum ConsumerSide {}

/// A cursor snapshot that only one side ever touches.
struct Local<Side>(UnsafeCell<usize>, PhantomData<Side>);

impl<Side> Local<Side> {
    fn new(value: usize) -> Self {
        Self(UnsafeCell::new(value), PhantomData)
    }

    /// # Safety
    ///
    /// Caller must be the side that owns this snapshot.
    #[inline(always)]
    unsafe fn get(&self) -> usize {
        self.0.with(|ptr| unsafe { *ptr })
    }

    /// # Safety
    ///
    /// Caller must be the side that owns this snapshot.
    #[inline(always)]
    unsafe fn set(&self, value: usize) {
        self.0.with_mut(|ptr| unsafe { *ptr = value });
    }
}

/// A bounded single-producer single-consumer FIFO.
///
/// `Fifo` owns its storage. Through `&mut self` it can be used directly as a
/// single-threaded queue; to hand values between two threads, [`split`] it
/// into a [`Producer`] and a [`Consumer`].
///
/// # Example
///
/// ```
/// use nexus_fifo::Fifo;
///
/// let mut fifo = Fifo::<char>::new(3);
///
/// assert!(fifo.push('a').is_ok());
/// assert!(fifo.push('b').is_ok());
/// assert!(fifo.push('c').is_ok());
/// assert!(fifo.is_full());
/// assert_eq!(fifo.push('d').unwrap_err().into_inner(), 'd');
///
/// assert_eq!(fifo.pop(), Some('a'));
/// assert!(fifo.push('d').is_ok());
/// assert_eq!(fifo.len(), 3);
/// ```
///
/// The `capacity + 1` slots come from an [`Allocator`], [`Global`] unless
/// one of the `*_in` constructors is used. The same allocator releases them
/// on drop.
///
/// [`split`]: Fifo::split
/// [`Producer`]: crate::Producer
/// [`Consumer`]: crate::Consumer
#[repr(C)]
pub struct Fifo<T, C: Cursor = usize, A: Allocator = Global> {
    buffer: NonNull<T>,
    /// Layout of the `capacity + 1` slots behind `buffer`.
    layout: Layout,
    capacity: usize,
    drop_policy: DropPolicy,

    /// Loaded and stored by the producer; loaded by the consumer.
    push_cursor: CachePadded<C::Atomic>,
    /// Exclusive to the producer.
    pop_cursor_cached: CachePadded<Local<ProducerSide>>,
    /// Loaded and stored by the consumer; loaded by the producer.
    pop_cursor: CachePadded<C::Atomic>,
    /// Exclusive to the consumer.
    push_cursor_cached: CachePadded<Local<ConsumerSide>>,

    alloc: A,
    _owns: PhantomData<T>,
}

// SAFETY: the queue owns its elements and its allocator; sending it sends
// them.
unsafe impl<T: Send, C: Cursor, A: Allocator + Send> Send for Fifo<T, C, A> {}

// SAFETY: shared references only reach slots through `enqueue`/`dequeue`,
// whose callers guarantee one producer and one consumer. The full/empty
// protocol keeps their slots disjoint, and the Release/Acquire cursor pairs
// hand each slot across. The allocator is only touched by `Drop`, which has
// exclusive access.
unsafe impl<T: Send, C: Cursor, A: Allocator + Send> Sync for Fifo<T, C, A> {}

impl<T> Fifo<T> {
    /// Creates a queue holding up to `capacity` elements, with `usize` cursors.
    ///
    /// Remaining elements are leaked on drop; see [`DropPolicy`].
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or the slot array would not fit in memory.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(Config::new(capacity))
    }

    /// Fallible version of [`Fifo::new`].
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_new(capacity: usize) -> Result<Self, CapacityError> {
        Self::try_with_config(Config::new(capacity))
    }
}

impl<T, C: Cursor> Fifo<T, C> {
    /// Creates a queue from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected by [`Config::validate`].
    pub fn with_config(config: Config) -> Self {
        Self::with_config_in(config, Global)
    }

    /// Creates a queue from `config`, returning an error if it is invalid.
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_with_config(config: Config) -> Result<Self, CapacityError> {
        Self::try_with_config_in(config, Global)
    }
}

impl<T, A: Allocator> Fifo<T, usize, A> {
    /// Creates a queue holding up to `capacity` elements in storage from
    /// `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or the slot array would not fit in memory.
    pub fn new_in(capacity: usize, alloc: A) -> Self {
        Self::with_config_in(Config::new(capacity), alloc)
    }

    /// Fallible version of [`Fifo::new_in`].
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_new_in(capacity: usize, alloc: A) -> Result<Self, CapacityError> {
        Self::try_with_config_in(Config::new(capacity), alloc)
    }
}

impl<T, C: Cursor, A: Allocator> Fifo<T, C, A> {
    /// Creates a queue from `config` in storage from `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected by [`Config::validate`].
    pub fn with_config_in(config: Config, alloc: A) -> Self {
        match Self::try_with_config_in(config, alloc) {
            Ok(fifo) => fifo,
            Err(err) => panic!("invalid fifo configuration: {err}"),
        }
    }

    /// Creates a queue from `config` in storage from `alloc`, returning an
    /// error if the configuration is invalid.
    ///
    /// Allocation failure is not reported here: it aborts through
    /// [`handle_alloc_error`], as a failed `Vec` allocation would.
    ///
    /// # Errors
    ///
    /// See [`CapacityError`].
    pub fn try_with_config_in(config: Config, alloc: A) -> Result<Self, CapacityError> {
        config.validate::<T, C>()?;

        let capacity = config.capacity();
        let layout = Layout::array::<T>(capacity + 1)
            .map_err(|_| CapacityError::TooLarge { capacity })?;

        // Zero-sized slot arrays need no storage.
        let buffer = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match alloc.allocate(layout) {
                Ok(block) => block.cast::<T>(),
                Err(_) => handle_alloc_error(layout),
            }
        };

        debug!(
            capacity,
            bytes = layout.size(),
            cursor = std::any::type_name::<C>(),
            drop_policy = ?config.drop_policy(),
            "fifo allocated"
        );

        Ok(Self {
            buffer,
            layout,
            capacity,
            drop_policy: config.drop_policy(),
            push_cursor: CachePadded::new(C::atomic(0)),
            pop_cursor_cached: CachePadded::new(Local::new(0)),
            pop_cursor: CachePadded::new(C::atomic(0)),
            push_cursor_cached: CachePadded::new(Local::new(0)),
            alloc,
            _owns: PhantomData,
        })
    }

    /// Returns the maximum number of elements the queue holds at once.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the policy applied to remaining elements on drop.
    #[inline]
    pub const fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    /// Returns the number of elements currently in the queue.
    ///
    /// Both cursors are read without synchronization. When the other side is
    /// running the result is a snapshot that may already be stale, but it is
    /// always within `0..=capacity`.
    #[inline]
    pub fn len(&self) -> usize {
        let (push, pop) = self.cursors();
        self.occupied(push, pop)
    }

    /// Returns `true` if the queue holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let (push, pop) = self.cursors();
        push == pop
    }

    /// Returns `true` if the queue holds `capacity()` elements.
    #[inline]
    pub fn is_full(&self) -> bool {
        let (push, pop) = self.cursors();
        self.full(push, pop)
    }

    /// Pushes a value onto the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the queue is full, leaving it untouched.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        // SAFETY: `&mut self` excludes every other producer and consumer.
        unsafe { self.enqueue(value) }
    }

    /// Pops the value at the head of the queue, or `None` if it is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` excludes every other producer and consumer.
        unsafe { self.dequeue() }
    }

    /// Producer side of push.
    ///
    /// # Safety
    ///
    /// No other thread may call `enqueue` on this queue concurrently.
    #[inline]
    pub(crate) unsafe fn enqueue(&self, value: T) -> Result<(), Full<T>> {
        let push = C::load(&self.push_cursor, Ordering::Relaxed);

        // SAFETY: the caller is the only producer.
        let pop = unsafe { self.pop_cursor_cached.get() };
        if self.full(push, pop) {
            // SAFETY: forwarded from the caller.
            return unsafe { self.enqueue_slow(push, value) };
        }

        // SAFETY: the cached pop cursor only lags the real one, so a slot that
        // is free against it is free.
        unsafe { self.write(push, value) };
        Ok(())
    }

    #[cold]
    unsafe fn enqueue_slow(&self, push: usize, value: T) -> Result<(), Full<T>> {
        let pop = C::load(&self.pop_cursor, Ordering::Acquire);
        // SAFETY: the caller is the only producer.
        unsafe { self.pop_cursor_cached.set(pop) };

        if self.full(push, pop) {
            trace!(push, pop, "push rejected, queue full");
            return Err(Full(value));
        }

        // SAFETY: the Acquire load above orders the consumer's read of this
        // slot before our write.
        unsafe { self.write(push, value) };
        Ok(())
    }

    /// Consumer side of pop.
    ///
    /// # Safety
    ///
    /// No other thread may call `dequeue` on this queue concurrently.
    #[inline]
    pub(crate) unsafe fn dequeue(&self) -> Option<T> {
        let pop = C::load(&self.pop_cursor, Ordering::Relaxed);

        // SAFETY: the caller is the only consumer.
        let push = unsafe { self.push_cursor_cached.get() };
        if push == pop {
            // SAFETY: forwarded from the caller.
            return unsafe { self.dequeue_slow(pop) };
        }

        // SAFETY: the cached push cursor was published with Release and read
        // with Acquire, so the slot is initialized.
        Some(unsafe { self.read(pop) })
    }

    #[cold]
    unsafe fn dequeue_slow(&self, pop: usize) -> Option<T> {
        let push = C::load(&self.push_cursor, Ordering::Acquire);
        // SAFETY: the caller is the only consumer.
        unsafe { self.push_cursor_cached.set(push) };

        if push == pop {
            trace!(push, pop, "pop rejected, queue empty");
            return None;
        }

        // SAFETY: the Acquire load above makes the producer's write visible.
        Some(unsafe { self.read(pop) })
    }

    /// # Safety
    ///
    /// `push` must be the producer's cursor and the slot must be free.
    #[inline(always)]
    unsafe fn write(&self, push: usize, value: T) {
        // SAFETY: `push <= capacity`, inside the `capacity + 1` slots.
        unsafe { self.buffer.as_ptr().add(push).write(value) };
        C::store(&self.push_cursor, self.advance(push), Ordering::Release);
    }

    /// # Safety
    ///
    /// `pop` must be the consumer's cursor and the slot must be live.
    #[inline(always)]
    unsafe fn read(&self, pop: usize) -> T {
        // SAFETY: `pop <= capacity`; moving out ends the slot's ownership,
        // and the Release store below hands it back afterwards.
        let value = unsafe { self.buffer.as_ptr().add(pop).read() };
        C::store(&self.pop_cursor, self.advance(pop), Ordering::Release);
        value
    }

    #[inline(always)]
    fn cursors(&self) -> (usize, usize) {
        (
            C::load(&self.push_cursor, Ordering::Relaxed),
            C::load(&self.pop_cursor, Ordering::Relaxed),
        )
    }

    /// Next slot after `cursor`; wraps to 0 after the sentinel slot.
    #[inline(always)]
    const fn advance(&self, cursor: usize) -> usize {
        if cursor == self.capacity {
            0
        } else {
            cursor + 1
        }
    }

    #[inline(always)]
    const fn full(&self, push: usize, pop: usize) -> bool {
        if push < pop {
            push == pop - 1
        } else if pop < push {
            push - pop == self.capacity
        } else {
            false
        }
    }

    #[inline(always)]
    const fn occupied(&self, push: usize, pop: usize) -> usize {
        if pop <= push {
            push - pop
        } else {
            self.capacity - (pop - (push + 1))
        }
    }
}

impl<T, C: Cursor, A: Allocator> Drop for Fifo<T, C, A> {
    fn drop(&mut self) {
        let (push, pop) = self.cursors();

        debug!(
            live = self.occupied(push, pop),
            drop_policy = ?self.drop_policy,
            "fifo released"
        );

        if self.drop_policy == DropPolicy::DropRemaining && mem::needs_drop::<T>() {
            let mut cursor = pop;
            while cursor != push {
                // SAFETY: slots in [pop, push) are live and owned by us now.
                unsafe { ptr::drop_in_place(self.buffer.as_ptr().add(cursor)) };
                cursor = self.advance(cursor);
            }
        }

        if self.layout.size() != 0 {
            // SAFETY: `buffer` was allocated by `alloc` with `layout` in
            // `try_with_config_in` and is released exactly once.
            unsafe { self.alloc.deallocate(self.buffer.cast(), self.layout) };
        }
    }
}

impl<T, C: Cursor, A: Allocator> fmt::Debug for Fifo<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fifo")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}


#[cfg(all(test, loom))]
mod loom_tests {
    use loom::sync::Arc;
    use loom::thread;

    use super::*;

    /// Producer pushes K items through a small ring; the consumer must see
    /// them in order under every interleaving.
    #[test]
    fn loom_fifo_order() {
        const K: u32 = 3;

        loom::model(|| {
            let fifo = Arc::new(Fifo::<u32>::new(2));
            let producer_fifo = Arc::clone(&fifo);

            let producer = thread::spawn(move || {
                for i in 0..K {
                    // SAFETY: only this thread produces.
                    while unsafe { producer_fifo.enqueue(i) }.is_err() {
                        thread::yield_now();
                    }
                }
            });

            let mut received = Vec::new();
            while received.len() < K as usize {
                // SAFETY: only this thread consumes.
                match unsafe { fifo.dequeue() } {
                    Some(v) => received.push(v),
                    None => thread::yield_now(),
                }
            }

            producer.join().unwrap();
            assert_eq!(received, vec![0, 1, 2]);
        });
    }

    /// Both snapshots are refreshed from their own side while the other side
    /// runs; loom's cell tracking rejects any cross-side access.
    #[test]
    fn loom_snapshots_stay_on_their_side() {
        loom::model(|| {
            let fifo = Arc::new(Fifo::<u32>::new(1));
            let producer_fifo = Arc::clone(&fifo);

            let producer = thread::spawn(move || {
                for i in 0..2 {
                    // SAFETY: only this thread produces.
                    while unsafe { producer_fifo.enqueue(i) }.is_err() {
                        thread::yield_now();
                    }
                }
                // SAFETY: read from the producer thread that owns it.
                unsafe { producer_fifo.pop_cursor_cached.get() }
            });

            let mut received = 0;
            while received < 2 {
                // SAFETY: only this thread consumes.
                match unsafe { fifo.dequeue() } {
                    Some(v) => {
                        assert_eq!(v, received);
                        received += 1;
                    }
                    None => thread::yield_now(),
                }
            }
            // SAFETY: read from the consumer thread that owns it.
            let push_seen = unsafe { fifo.push_cursor_cached.get() };

            let pop_seen = producer.join().unwrap();
            assert!(pop_seen <= 1);
            assert_eq!(push_seen, 0);
        });
    }

    /// Capacity one with narrow cursors: every push must wait for a pop.
    #[test]
    fn loom_capacity_one_handoff() {
        loom::model(|| {
            let fifo = Arc::new(Fifo::<u32, u8>::with_config(Config::new(1)));
            let producer_fifo = Arc::clone(&fifo);

            let producer = thread::spawn(move || {
                for i in 0..2 {
                    // SAFETY: only this thread produces.
                    while unsafe { producer_fifo.enqueue(i) }.is_err() {
                        thread::yield_now();
                    }
                }
            });

            for expected in 0..2 {
                loop {
                    // SAFETY: only this thread consumes.
                    if let Some(v) = unsafe { fifo.dequeue() } {
                        assert_eq!(v, expected);
                        break;
                    }
                    thread::yield_now();
                }
            }

            producer.join().unwrap();
            assert!(fifo.is_empty());
        });
    }
}
