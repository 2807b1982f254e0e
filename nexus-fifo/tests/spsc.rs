//! End-to-end tests through the public constructors and handles.

#![cfg(not(loom))]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use nexus_fifo::{CapacityError, Config, DropPolicy, Fifo, ring_buffer};

#[test]
fn walkthrough_capacity_three() {
    let (mut tx, mut rx) = ring_buffer::<&str>(3);

    assert!(tx.push("A").is_ok());
    assert!(tx.push("B").is_ok());
    assert!(tx.push("C").is_ok());
    assert!(tx.is_full());
    assert_eq!(tx.push("D").unwrap_err().into_inner(), "D");

    assert_eq!(rx.pop(), Some("A"));
    assert!(!rx.is_full());
    assert!(tx.push("D").is_ok());

    assert_eq!(rx.pop(), Some("B"));
    assert_eq!(rx.pop(), Some("C"));
    assert_eq!(rx.pop(), Some("D"));
    assert!(rx.is_empty());
}

#[test]
fn capacity_errors_surface_through_public_api() {
    assert_eq!(Fifo::<u8>::try_new(0).unwrap_err(), CapacityError::Zero);
    assert_eq!(
        Fifo::<u8, u16>::try_with_config(Config::new(70_000)).unwrap_err(),
        CapacityError::CursorOverflow {
            capacity: 70_000,
            max: 65_535
        }
    );
    assert_eq!(
        CapacityError::Zero.to_string(),
        "capacity must be non-zero"
    );
}

#[test]
fn round_trip_distinct_values() {
    const COUNT: usize = 200_000;

    let (mut tx, mut rx) = ring_buffer::<usize>(128);

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            while tx.push(i).is_err() {
                std::hint::spin_loop();
            }
        }
    });

    let consumer = thread::spawn(move || {
        let mut received = Vec::with_capacity(COUNT);
        while received.len() < COUNT {
            match rx.pop() {
                Some(v) => received.push(v),
                None => std::hint::spin_loop(),
            }
        }
        (received, rx)
    });

    producer.join().unwrap();
    let (received, mut rx) = consumer.join().unwrap();

    assert!(received.iter().copied().eq(0..COUNT));
    assert_eq!(rx.pop(), None);
}

#[test]
fn round_trip_narrow_cursor_heavy_wrap() {
    const COUNT: u64 = 100_000;

    let (mut tx, mut rx) = Fifo::<u64, u8>::with_config(Config::new(3)).split();

    let producer = thread::spawn(move || {
        for i in 0..COUNT {
            while tx.push(i).is_err() {
                thread::yield_now();
            }
        }
    });

    let mut expected = 0;
    while expected < COUNT {
        match rx.pop() {
            Some(v) => {
                assert_eq!(v, expected);
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }

    producer.join().unwrap();
}

#[test]
fn owned_values_drop_exactly_once() {
    struct Tracked(Arc<AtomicUsize>);
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    const COUNT: usize = 10_000;
    const LEFT_BEHIND: usize = 5;

    let drops = Arc::new(AtomicUsize::new(0));
    let config = Config::new(16).with_drop_policy(DropPolicy::DropRemaining);
    let (mut tx, mut rx) = Fifo::<Tracked>::with_config(config).split();

    let counter = Arc::clone(&drops);
    let producer = thread::spawn(move || {
        for _ in 0..COUNT {
            let mut value = Tracked(Arc::clone(&counter));
            loop {
                match tx.push(value) {
                    Ok(()) => break,
                    Err(full) => {
                        value = full.into_inner();
                        std::hint::spin_loop();
                    }
                }
            }
        }
    });

    let mut popped = 0;
    while popped < COUNT - LEFT_BEHIND {
        if rx.pop().is_some() {
            popped += 1;
        }
    }
    producer.join().unwrap();

    assert_eq!(drops.load(Ordering::SeqCst), COUNT - LEFT_BEHIND);
    assert_eq!(rx.len(), LEFT_BEHIND);
    drop(rx);
    assert_eq!(drops.load(Ordering::SeqCst), COUNT);
}
