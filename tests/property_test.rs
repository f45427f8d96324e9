//! Property tests for outcome completion and joins.
//!
//! - an outcome completes once and the first decision sticks
//! - a join fires once, whatever the arrival order, with every slot in
//!   input order
//! - pending named waits each get their own binding

mod common;

use common::SimpleNativeService;
use promise_di::{await_all_iter, ChainedContainer, Future, Promise, ResolveErrorPolicy, Settings};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
enum ProducerOp {
    Set(i32),
    Cancel,
    Drop,
}

fn arb_producer_op() -> impl Strategy<Value = ProducerOp> {
    prop_oneof![
        any::<i32>().prop_map(ProducerOp::Set),
        Just(ProducerOp::Cancel),
        Just(ProducerOp::Drop),
    ]
}

/// Inputs of a join, `None` meaning the input gets canceled, together with
/// the order their producers complete in.
fn arb_join_arrivals() -> impl Strategy<Value = (Vec<Option<i32>>, Vec<usize>)> {
    prop::collection::vec(prop::option::of(any::<i32>()), 1..8).prop_flat_map(|inputs| {
        let order: Vec<usize> = (0..inputs.len()).collect();
        (Just(inputs), Just(order).prop_shuffle())
    })
}

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,6}", 1..6)
        .prop_map(|names| names.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn first_decision_sticks(ops in prop::collection::vec(arb_producer_op(), 1..10)) {
        let root = Promise::<i32>::new();
        let future = root.get_future();
        let producers: Vec<Promise<i32>> = ops.iter().map(|_| root.clone()).collect();
        drop(root);

        let mut decided: Option<Option<i32>> = None;
        for (op, producer) in ops.iter().zip(producers) {
            match op {
                ProducerOp::Set(value) if !producer.is_complete() => {
                    producer.set_value(*value);
                    decided.get_or_insert(Some(*value));
                }
                ProducerOp::Set(_) => drop(producer),
                ProducerOp::Cancel => {
                    if !producer.is_complete() {
                        decided.get_or_insert(None);
                    }
                    producer.cancel();
                }
                ProducerOp::Drop => drop(producer),
            }
            if let Some(expected) = decided {
                prop_assert!(future.is_ready());
                prop_assert_eq!(future.was_canceled(), expected.is_none());
            }
        }

        prop_assert!(future.is_ready());
        prop_assert_eq!(future.consume(), decided.flatten());
    }

    #[test]
    fn join_fires_once_in_any_arrival_order((inputs, order) in arb_join_arrivals()) {
        let promises: Vec<Promise<i32>> = inputs.iter().map(|_| Promise::new()).collect();
        let futures: Vec<Future<i32>> = promises.iter().map(Promise::get_future).collect();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let joined = await_all_iter(futures).and_then(move |values| {
            counter.fetch_add(1, Ordering::SeqCst);
            values
        });

        let mut promises: Vec<Option<Promise<i32>>> = promises.into_iter().map(Some).collect();
        for (arrived, &index) in order.iter().enumerate() {
            prop_assert!(!joined.is_ready());
            if let Some(promise) = promises[index].take() {
                match inputs[index] {
                    Some(value) => promise.set_value(value),
                    None => promise.cancel(),
                }
            }
            prop_assert_eq!(joined.is_ready(), arrived + 1 == order.len());
        }

        prop_assert_eq!(fired.load(Ordering::SeqCst), 1);
        prop_assert_eq!(joined.consume(), Some(inputs));
    }

    #[test]
    fn named_waits_get_their_own_binding(names in arb_names()) {
        let container = ChainedContainer::with_settings(
            Settings::default().with_resolve_error_policy(ResolveErrorPolicy::ReturnEmpty),
        );
        let waits: Vec<_> = names
            .iter()
            .map(|name| container.resolve().wait_for_named::<SimpleNativeService>(name))
            .collect();
        for (position, name) in names.iter().enumerate().rev() {
            let service = Arc::new(SimpleNativeService { a: position as i32 });
            container.bind().named_instance::<SimpleNativeService>(service, name);
        }
        for (position, wait) in waits.into_iter().enumerate() {
            prop_assert_eq!(wait.consume().map(|service| service.a), Some(position as i32));
        }
        prop_assert_eq!(container.pending_count(), 0);
    }
}
