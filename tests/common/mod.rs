#![allow(dead_code)]

use promise_di::{HostObject, InterfaceRef, ReferenceCollector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A host object bound by reference.
pub struct SimpleObjectService {
    pub a: i32,
    alive: AtomicBool,
}

impl SimpleObjectService {
    pub fn new(a: i32) -> Arc<Self> {
        Arc::new(Self {
            a,
            alive: AtomicBool::new(true),
        })
    }

    /// Marks the object as destroyed by the host.
    pub fn destroy(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl HostObject for SimpleObjectService {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

pub trait SimpleInterface: Send + Sync {
    fn get_a(&self) -> i32;
}

pub struct SimpleInterfaceImpl {
    pub a: i32,
}

impl HostObject for SimpleInterfaceImpl {}

impl SimpleInterface for SimpleInterfaceImpl {
    fn get_a(&self) -> i32 {
        self.a
    }
}

pub fn simple_interface(a: i32) -> InterfaceRef<dyn SimpleInterface> {
    InterfaceRef::new(Arc::new(SimpleInterfaceImpl { a }), |object| object as Arc<dyn SimpleInterface>)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleValueService {
    pub a: i32,
}

#[derive(Debug, Default)]
pub struct SimpleNativeService {
    pub a: i32,
}

/// A second native type, for waits that span several types.
#[derive(Debug, Default)]
pub struct OtherNativeService {
    pub name: String,
}

promise_di::declare_object_type!(SimpleObjectService);
promise_di::declare_interface_type!(dyn SimpleInterface);
promise_di::declare_value_type!(SimpleValueService);
promise_di::declare_native_type!(SimpleNativeService);
promise_di::declare_native_type!(OtherNativeService);

#[derive(Default)]
pub struct CountingCollector {
    pub objects: usize,
}

impl ReferenceCollector for CountingCollector {
    fn add_referenced_object(&mut self, _object: &Arc<dyn HostObject>) {
        self.objects += 1;
    }
}
