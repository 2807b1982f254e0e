//! # nexus-fifo
//!
//! Bounded lock-free single-producer single-consumer FIFO for latency-sensitive
//! inter-thread handoff.
//!
//! ## Features
//!
//! - **Constrained cursors**: read and write cursors stay within
//!   `[0, capacity]`; no intermediate value ever overflows or goes negative.
//!   A sentinel slot distinguishes full from empty without a counter.
//! - **Narrow cursor types**: `u8`, `u16`, `u32`, `u64` or `usize` cursors,
//!   see [`Cursor`].
//! - **Cached cursors**: each side keeps a private snapshot of the other
//!   side's cursor and only pays for an Acquire load when the snapshot says
//!   the queue is full (producer) or empty (consumer).
//! - **Cache-line isolation**: both cursors and both snapshots sit on their
//!   own [`CACHE_LINE`].
//! - **Pluggable storage**: slots come from any [`Allocator`] (the stable
//!   `allocator-api2` trait), [`Global`] by default.
//! - **Non-blocking**: push and pop never wait. Full and empty are ordinary
//!   results; retry policy belongs to the caller.
//!
//! ## Example
//!
//! ```
//! use std::thread;
//!
//! let (mut tx, mut rx) = nexus_fifo::ring_buffer::<u64>(1024);
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..10_000 {
//!         while tx.push(i).is_err() {
//!             std::hint::spin_loop();
//!         }
//!     }
//! });
//!
//! let mut next = 0;
//! while next < 10_000 {
//!     if let Some(v) = rx.pop() {
//!         assert_eq!(v, next);
//!         next += 1;
//!     }
//! }
//! producer.join().unwrap();
//! ```
//!
//! ## Drop behavior
//!
//! By default, elements still in the queue when it is dropped are leaked,
//! not dropped. Choose [`DropPolicy::DropRemaining`] through [`Config`] if
//! the element type owns resources or has a side-effecting `Drop`.
//!
//! ## Logging
//!
//! With the `tracing` feature the queue emits `debug` events on allocation
//! and release and `trace` events when a push or pop is rejected after
//! refreshing its cached cursor. The fast path never logs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod cursor;
mod error;
mod fifo;
mod handle;
mod sync;
mod trace;

pub use allocator_api2::alloc::{Allocator, Global};
pub use config::{Config, DropPolicy};
pub use cursor::Cursor;
pub use error::{CapacityError, Full};
pub use fifo::{CACHE_LINE, Fifo};
pub use handle::{Consumer, Producer, ring_buffer};
pub use trace::init_tracing;
