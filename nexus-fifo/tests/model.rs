//! Model-based tests: random push/pop sequences checked against `VecDeque`.

#![cfg(not(loom))]

use std::collections::VecDeque;

use nexus_fifo::{Config, Cursor, Fifo, Full};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Pop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u32>().prop_map(Op::Push), Just(Op::Pop)]
}

fn check_against_model<C: Cursor>(
    mut fifo: Fifo<u32, C>,
    ops: &[Op],
) -> Result<(), TestCaseError> {
    let capacity = fifo.capacity();
    let mut model = VecDeque::with_capacity(capacity);

    for op in ops {
        match *op {
            Op::Push(v) => match fifo.push(v) {
                Ok(()) => model.push_back(v),
                Err(Full(rejected)) => {
                    prop_assert_eq!(rejected, v);
                    prop_assert_eq!(model.len(), capacity);
                }
            },
            Op::Pop => {
                prop_assert_eq!(fifo.pop(), model.pop_front());
            }
        }

        prop_assert_eq!(fifo.len(), model.len());
        prop_assert!(fifo.len() <= capacity);
        prop_assert_eq!(fifo.is_empty(), model.is_empty());
        prop_assert_eq!(fifo.is_full(), model.len() == capacity);
        prop_assert!(!(fifo.is_empty() && fifo.is_full()));
    }

    while let Some(expected) = model.pop_front() {
        prop_assert_eq!(fifo.pop(), Some(expected));
    }
    prop_assert!(fifo.is_empty());
    Ok(())
}

proptest! {
    #[test]
    fn matches_vecdeque(
        capacity in 1usize..16,
        ops in proptest::collection::vec(op_strategy(), 0..500),
    ) {
        check_against_model(Fifo::<u32>::new(capacity), &ops)?;
    }

    #[test]
    fn matches_vecdeque_u8_cursor(
        capacity in prop_oneof![1usize..8, 250usize..=255],
        ops in proptest::collection::vec(op_strategy(), 0..2000),
    ) {
        check_against_model(Fifo::<u32, u8>::with_config(Config::new(capacity)), &ops)?;
    }
}
