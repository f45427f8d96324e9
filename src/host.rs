//! Contracts with the host object model.
//!
//! The host owns object lifetimes and may run a tracing collector. Bound
//! objects report their liveness through [`HostObject::is_alive`], and
//! bindings hand their strong references to a [`ReferenceCollector`] when the
//! host asks for them.

use std::any::Any;
use std::sync::Arc;

use crate::type_id::ReflectedType;

/// An object whose lifetime is managed by the host. It can be destroyed from
/// the host's point of view while still referenced here, after which it
/// reports itself dead and its bindings become invalid.
pub trait HostObject: Any + Send + Sync {
    fn is_alive(&self) -> bool {
        true
    }
}

/// Receives the strong references held by bindings.
pub trait ReferenceCollector {
    fn add_referenced_object(&mut self, object: &Arc<dyn HostObject>);

    fn add_referenced_type(&mut self, _ty: ReflectedType) {}
}

/// Values bound by copy that hold references of their own.
pub trait Trace {
    fn trace(&self, _collector: &mut dyn ReferenceCollector) {}
}
