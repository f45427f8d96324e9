mod common;

use common::{OtherNativeService, SimpleNativeService, SimpleValueService};
use promise_di::{inject_async, ChainedContainer, ConflictPolicy, ForkingContainer, ResolveErrorPolicy, Settings};
use std::sync::{Arc, Barrier};
use std::thread;

fn quiet_container() -> Arc<ChainedContainer> {
    ChainedContainer::with_settings(Settings::default().with_resolve_error_policy(ResolveErrorPolicy::ReturnEmpty))
}

/// Two parents joined by a fork, with `child` below the fork.
struct Diamond {
    low: Arc<ChainedContainer>,
    high: Arc<ChainedContainer>,
    fork: Arc<ForkingContainer>,
    child: Arc<ChainedContainer>,
}

fn diamond() -> Diamond {
    let low = quiet_container();
    let high = quiet_container();
    let fork = ForkingContainer::new();
    let child = quiet_container();
    fork.add_parent(low.clone(), 0);
    fork.add_parent(high.clone(), 1);
    child.set_parent(fork.clone());
    Diamond { low, high, fork, child }
}

#[test]
fn test_child_resolves_through_fork_by_priority() {
    let graph = diamond();
    graph.low.bind().instance::<SimpleValueService>(SimpleValueService { a: 0 });
    graph.high.bind().instance::<SimpleValueService>(SimpleValueService { a: 1 });
    assert_eq!(graph.child.resolve().try_get::<SimpleValueService>(), Some(SimpleValueService { a: 1 }));
}

#[test]
fn test_child_falls_back_to_lower_priority_parent() {
    let graph = diamond();
    graph.low.bind().instance::<SimpleValueService>(SimpleValueService { a: 0 });
    assert_eq!(graph.child.resolve().try_get::<SimpleValueService>(), Some(SimpleValueService { a: 0 }));
}

#[test]
fn test_child_wait_resolved_by_bind_in_either_parent() {
    let graph = diamond();
    let from_low = graph.child.resolve().wait_for::<SimpleNativeService>();
    let from_high = graph.child.resolve().wait_for::<OtherNativeService>();
    graph.low.bind().instance::<SimpleNativeService>(Arc::new(SimpleNativeService { a: 3 }));
    graph.high.bind().instance::<OtherNativeService>(Arc::new(OtherNativeService { name: "high".into() }));
    assert_eq!(from_low.consume().map(|service| service.a), Some(3));
    assert_eq!(from_high.consume().map(|service| service.name.clone()).as_deref(), Some("high"));
    assert_eq!(graph.child.pending_count(), 0);
}

#[test]
fn test_child_binding_shadows_fork() {
    let graph = diamond();
    graph.high.bind().instance::<SimpleValueService>(SimpleValueService { a: 1 });
    graph.child.bind().instance::<SimpleValueService>(SimpleValueService { a: 2 });
    assert_eq!(graph.child.resolve().try_get::<SimpleValueService>(), Some(SimpleValueService { a: 2 }));
    assert_eq!(graph.high.resolve().try_get::<SimpleValueService>(), Some(SimpleValueService { a: 1 }));
}

#[test]
fn test_parent_does_not_see_child_bindings() {
    let graph = diamond();
    graph.child.bind().instance::<SimpleValueService>(SimpleValueService { a: 2 });
    assert!(graph.low.resolve().try_get::<SimpleValueService>().is_none());
    assert!(graph.high.resolve().try_get::<SimpleValueService>().is_none());
}

#[test]
fn test_removed_parent_no_longer_searched() {
    let graph = diamond();
    graph.high.bind().instance::<SimpleValueService>(SimpleValueService { a: 1 });
    assert!(graph.fork.remove_parent(graph.high.clone()));
    assert!(graph.child.resolve().try_get::<SimpleValueService>().is_none());
    let pending = graph.child.resolve().wait_for::<SimpleNativeService>();
    graph.high.bind().instance::<SimpleNativeService>(Arc::new(SimpleNativeService::default()));
    assert!(!pending.is_ready());
}

#[test]
fn test_dropped_fork_detaches_child() {
    let Diamond { high, fork, child, .. } = diamond();
    drop(fork);
    high.bind().instance::<SimpleValueService>(SimpleValueService { a: 1 });
    assert!(child.parent().is_none());
    assert!(child.resolve().try_get::<SimpleValueService>().is_none());
}

#[test]
fn test_set_parent_fires_waits_already_satisfiable() {
    let parent = quiet_container();
    parent.bind().instance::<SimpleNativeService>(Arc::new(SimpleNativeService { a: 8 }));
    let child = quiet_container();
    let pending = child.resolve().wait_for::<SimpleNativeService>();
    assert!(!pending.is_ready());
    child.set_parent(parent.clone());
    assert_eq!(pending.consume().map(|service| service.a), Some(8));
}

#[test]
fn test_add_parent_to_fork_fires_waits_below() {
    let fork = ForkingContainer::new();
    let child = quiet_container();
    child.set_parent(fork.clone());
    let pending = child.resolve().wait_for::<SimpleNativeService>();

    let parent = quiet_container();
    parent.bind().instance::<SimpleNativeService>(Arc::new(SimpleNativeService { a: 5 }));
    fork.add_parent(parent.clone(), 0);
    assert_eq!(pending.consume().map(|service| service.a), Some(5));
}

#[test]
fn test_grandchild_wait_resolved_from_root() {
    let root = quiet_container();
    let middle = quiet_container();
    let leaf = quiet_container();
    middle.set_parent(root.clone());
    leaf.set_parent(middle.clone());
    let pending = leaf.resolve().wait_for_named::<SimpleNativeService>("deep");
    root.bind().named_instance::<SimpleNativeService>(Arc::new(SimpleNativeService { a: 9 }), "deep");
    assert_eq!(pending.consume().map(|service| service.a), Some(9));
}

/// Service A needs service B, which the parent binds later on. The child
/// publishes A once B shows up.
#[test]
fn test_service_published_after_dependency_arrives() {
    struct ServiceB(i32);
    struct ServiceA {
        doubled: i32,
    }
    promise_di::declare_native_type!(ServiceB);
    promise_di::declare_native_type!(ServiceA);

    let parent = quiet_container();
    let child = quiet_container();
    child.set_parent(parent.clone());

    let a_ready = inject_async!(child.resolve(), move |b: ServiceB| Arc::new(ServiceA { doubled: b.0 * 2 }));
    let published = child.resolve().wait_for::<ServiceA>();

    let bound = a_ready.and_then({
        let child = Arc::clone(&child);
        move |a| child.bind().instance_with::<ServiceA>(a, ConflictPolicy::AssertCheck)
    });
    parent.bind().instance::<ServiceB>(Arc::new(ServiceB(21)));

    assert_eq!(bound.consume(), Some(promise_di::BindResult::Bound));
    assert_eq!(published.consume().map(|a| a.doubled), Some(42));
    assert!(parent.resolve().try_get::<ServiceA>().is_none());
}

#[test]
fn test_concurrent_bind_and_wait_never_loses_wakeup() {
    for round in 0..300 {
        let parent = quiet_container();
        let child = quiet_container();
        child.set_parent(parent.clone());
        let start = Arc::new(Barrier::new(2));

        let binder = {
            let parent = Arc::clone(&parent);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                parent.bind().instance::<SimpleNativeService>(Arc::new(SimpleNativeService { a: round }));
            })
        };
        start.wait();
        let wait = child.resolve().wait_for::<SimpleNativeService>();
        binder.join().expect("The binder thread has panicked");

        assert!(wait.is_ready(), "round {round} lost its wakeup");
        assert_eq!(wait.consume().map(|service| service.a), Some(round));
        assert_eq!(child.pending_count(), 0);
    }
}
