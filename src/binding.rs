//! Type-erased bound values.
//!
//! A binding holds one of four categories of value:
//!
//! | kind | handle | valid while |
//! |---|---|---|
//! | [`BindingKind::Object`] | `Arc<T>` of a [`HostObject`] | the object is alive |
//! | [`BindingKind::Interface`] | [`InterfaceRef<dyn I>`] | the implementing object is alive |
//! | [`BindingKind::Value`] | a copy of `T` | always |
//! | [`BindingKind::Shared`] | `Arc<T>` | always |
//!
//! A type picks its category once, by implementing [`Bindable`] through one
//! of [`declare_object_type!`](crate::declare_object_type),
//! [`declare_interface_type!`](crate::declare_interface_type),
//! [`declare_value_type!`](crate::declare_value_type) or
//! [`declare_native_type!`](crate::declare_native_type).

use std::any::Any;
use std::fmt::{self, Debug};
use std::ops::Deref;
use std::sync::Arc;

use crate::binding_id::BindingId;
use crate::host::{HostObject, ReferenceCollector, Trace};
use crate::type_id::TypeIdentity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Object,
    Interface,
    Value,
    Shared,
}

/// A type that can be bound, and the handle a resolve hands back for it.
pub trait Bindable: TypeIdentity {
    type Ref: Clone + Send + Sync + 'static;

    fn kind() -> BindingKind;

    fn into_instance(instance: Self::Ref) -> BindingInstance;

    fn from_instance(instance: &BindingInstance) -> Option<Self::Ref>;
}

/// A capability implemented by a host object, together with that object so
/// its liveness can be checked.
pub struct InterfaceRef<I: ?Sized> {
    object: Arc<dyn HostObject>,
    interface: Arc<I>,
}

impl<I: ?Sized> InterfaceRef<I> {
    /// `cast` turns the object into the interface, usually `|o| o as Arc<dyn I>`.
    pub fn new<O: HostObject>(object: Arc<O>, cast: impl FnOnce(Arc<O>) -> Arc<I>) -> Self {
        let interface = cast(Arc::clone(&object));
        Self { object, interface }
    }

    pub fn object(&self) -> &Arc<dyn HostObject> {
        &self.object
    }

    pub fn interface(&self) -> &Arc<I> {
        &self.interface
    }

    pub fn is_alive(&self) -> bool {
        self.object.is_alive()
    }
}

impl<I: ?Sized> Clone for InterfaceRef<I> {
    fn clone(&self) -> Self {
        Self {
            object: Arc::clone(&self.object),
            interface: Arc::clone(&self.interface),
        }
    }
}

impl<I: ?Sized> Deref for InterfaceRef<I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.interface
    }
}

impl<I: ?Sized> Debug for InterfaceRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceRef")
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

/// Copied data held by a value binding.
pub trait ValueData: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn trace(&self, collector: &mut dyn ReferenceCollector);
}

impl<T: Trace + Send + Sync + 'static> ValueData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn trace(&self, collector: &mut dyn ReferenceCollector) {
        Trace::trace(self, collector);
    }
}

enum Instance {
    Object {
        object: Arc<dyn HostObject>,
        typed: Arc<dyn Any + Send + Sync>,
    },
    Interface {
        object: Arc<dyn HostObject>,
        typed: Arc<dyn Any + Send + Sync>,
    },
    Value(Arc<dyn ValueData>),
    Shared(Arc<dyn Any + Send + Sync>),
}

/// The stored value of a binding, in one of the four categories.
pub struct BindingInstance(Instance);

impl BindingInstance {
    pub fn object<T: HostObject>(object: Arc<T>) -> Self {
        let typed: Arc<dyn Any + Send + Sync> = Arc::clone(&object) as Arc<dyn Any + Send + Sync>;
        Self(Instance::Object { object, typed })
    }

    pub fn interface<I: ?Sized + Send + Sync + 'static>(interface: InterfaceRef<I>) -> Self {
        Self(Instance::Interface {
            object: Arc::clone(interface.object()),
            typed: Arc::new(interface),
        })
    }

    pub fn value<T: Trace + Send + Sync + 'static>(value: T) -> Self {
        Self(Instance::Value(Arc::new(value)))
    }

    pub fn shared<T: Send + Sync + 'static>(shared: Arc<T>) -> Self {
        Self(Instance::Shared(shared))
    }

    pub fn kind(&self) -> BindingKind {
        match &self.0 {
            Instance::Object { .. } => BindingKind::Object,
            Instance::Interface { .. } => BindingKind::Interface,
            Instance::Value(_) => BindingKind::Value,
            Instance::Shared(_) => BindingKind::Shared,
        }
    }

    pub fn is_valid(&self) -> bool {
        match &self.0 {
            Instance::Object { object, .. } | Instance::Interface { object, .. } => object.is_alive(),
            Instance::Value(_) | Instance::Shared(_) => true,
        }
    }

    pub fn trace(&self, collector: &mut dyn ReferenceCollector) {
        match &self.0 {
            Instance::Object { object, .. } | Instance::Interface { object, .. } => {
                collector.add_referenced_object(object);
            }
            Instance::Value(value) => value.trace(collector),
            Instance::Shared(_) => {}
        }
    }

    pub fn downcast_object<T: HostObject>(&self) -> Option<Arc<T>> {
        match &self.0 {
            Instance::Object { typed, .. } => Arc::clone(typed).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn downcast_interface<I: ?Sized + 'static>(&self) -> Option<InterfaceRef<I>> {
        match &self.0 {
            Instance::Interface { typed, .. } => typed.downcast_ref::<InterfaceRef<I>>().cloned(),
            _ => None,
        }
    }

    pub fn downcast_value<T: Clone + 'static>(&self) -> Option<T> {
        match &self.0 {
            Instance::Value(value) => value.as_any().downcast_ref::<T>().cloned(),
            _ => None,
        }
    }

    pub fn downcast_shared<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match &self.0 {
            Instance::Shared(shared) => Arc::clone(shared).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl Debug for BindingInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingInstance")
            .field("kind", &self.kind())
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// A bound value under its key.
#[derive(Debug)]
pub struct Binding {
    id: BindingId,
    instance: BindingInstance,
}

impl Binding {
    pub fn new<T: Bindable + ?Sized>(id: BindingId, instance: T::Ref) -> Self {
        debug_assert_eq!(id.type_key(), T::type_key(), "binding id must match the bound type");
        Self {
            id,
            instance: T::into_instance(instance),
        }
    }

    pub fn id(&self) -> &BindingId {
        &self.id
    }

    pub fn kind(&self) -> BindingKind {
        self.instance.kind()
    }

    /// False once the held object was destroyed by the host.
    pub fn is_valid(&self) -> bool {
        self.instance.is_valid()
    }

    /// The typed handle, or `None` when `T` is not the bound type.
    pub fn resolve<T: Bindable + ?Sized>(&self) -> Option<T::Ref> {
        T::from_instance(&self.instance)
    }

    pub fn trace(&self, collector: &mut dyn ReferenceCollector) {
        self.id.trace(collector);
        self.instance.trace(collector);
    }
}

/// Declares a [`HostObject`] type bound by reference.
#[macro_export]
macro_rules! declare_object_type {
    ($ty:ty) => {
        impl $crate::type_id::TypeIdentity for $ty {
            fn type_key() -> $crate::type_id::TypeKey {
                static INFO: $crate::type_id::ReflectedTypeInfo =
                    $crate::type_id::ReflectedTypeInfo::new(stringify!($ty));
                $crate::type_id::TypeKey::reflected(&INFO)
            }
        }

        impl $crate::binding::Bindable for $ty {
            type Ref = ::std::sync::Arc<$ty>;

            fn kind() -> $crate::binding::BindingKind {
                $crate::binding::BindingKind::Object
            }

            fn into_instance(instance: Self::Ref) -> $crate::binding::BindingInstance {
                $crate::binding::BindingInstance::object(instance)
            }

            fn from_instance(instance: &$crate::binding::BindingInstance) -> Option<Self::Ref> {
                instance.downcast_object::<$ty>()
            }
        }
    };
}

/// Declares a `dyn Trait` capability bound through [`InterfaceRef`]. The
/// trait must be `Send + Sync`.
#[macro_export]
macro_rules! declare_interface_type {
    ($ty:ty) => {
        impl $crate::type_id::TypeIdentity for $ty {
            fn type_key() -> $crate::type_id::TypeKey {
                static INFO: $crate::type_id::ReflectedTypeInfo =
                    $crate::type_id::ReflectedTypeInfo::new(stringify!($ty));
                $crate::type_id::TypeKey::reflected(&INFO)
            }
        }

        impl $crate::binding::Bindable for $ty {
            type Ref = $crate::binding::InterfaceRef<$ty>;

            fn kind() -> $crate::binding::BindingKind {
                $crate::binding::BindingKind::Interface
            }

            fn into_instance(instance: Self::Ref) -> $crate::binding::BindingInstance {
                $crate::binding::BindingInstance::interface(instance)
            }

            fn from_instance(instance: &$crate::binding::BindingInstance) -> Option<Self::Ref> {
                instance.downcast_interface::<$ty>()
            }
        }
    };
}

/// Declares a `Clone` struct bound by copy. Pass `traced` when the type
/// implements [`Trace`](crate::host::Trace) itself.
#[macro_export]
macro_rules! declare_value_type {
    ($ty:ty, traced) => {
        impl $crate::type_id::TypeIdentity for $ty {
            fn type_key() -> $crate::type_id::TypeKey {
                static INFO: $crate::type_id::ReflectedTypeInfo =
                    $crate::type_id::ReflectedTypeInfo::new(stringify!($ty));
                $crate::type_id::TypeKey::reflected(&INFO)
            }
        }

        impl $crate::binding::Bindable for $ty {
            type Ref = $ty;

            fn kind() -> $crate::binding::BindingKind {
                $crate::binding::BindingKind::Value
            }

            fn into_instance(instance: Self::Ref) -> $crate::binding::BindingInstance {
                $crate::binding::BindingInstance::value(instance)
            }

            fn from_instance(instance: &$crate::binding::BindingInstance) -> Option<Self::Ref> {
                instance.downcast_value::<$ty>()
            }
        }
    };
    ($ty:ty) => {
        impl $crate::host::Trace for $ty {}

        $crate::declare_value_type!($ty, traced);
    };
}

/// Declares a native type bound by shared ownership.
#[macro_export]
macro_rules! declare_native_type {
    ($ty:ty) => {
        impl $crate::type_id::TypeIdentity for $ty {
            fn type_key() -> $crate::type_id::TypeKey {
                $crate::type_id::TypeKey::native::<$ty>()
            }
        }

        impl $crate::binding::Bindable for $ty {
            type Ref = ::std::sync::Arc<$ty>;

            fn kind() -> $crate::binding::BindingKind {
                $crate::binding::BindingKind::Shared
            }

            fn into_instance(instance: Self::Ref) -> $crate::binding::BindingInstance {
                $crate::binding::BindingInstance::shared(instance)
            }

            fn from_instance(instance: &$crate::binding::BindingInstance) -> Option<Self::Ref> {
                instance.downcast_shared::<$ty>()
            }
        }
    };
}
