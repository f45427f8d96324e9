use crate::binding::{Bindable, Binding};
use crate::binding_id::BindingId;
use crate::container::Container;
use crate::policy::{BindResult, ConflictPolicy};

/// Typed binding into a container. Without an explicit policy the
/// container's default conflict policy applies.
pub struct Binder<'a, C: Container + ?Sized> {
    container: &'a C,
}

impl<'a, C: Container + ?Sized> Binder<'a, C> {
    pub fn new(container: &'a C) -> Self {
        Self { container }
    }

    pub fn instance<T: Bindable + ?Sized>(&self, instance: T::Ref) -> BindResult {
        self.named_instance_with::<T>(instance, None, self.container.settings().conflict_policy)
    }

    pub fn instance_with<T: Bindable + ?Sized>(&self, instance: T::Ref, policy: ConflictPolicy) -> BindResult {
        self.named_instance_with::<T>(instance, None, policy)
    }

    pub fn named_instance<T: Bindable + ?Sized>(&self, instance: T::Ref, name: &str) -> BindResult {
        self.named_instance_with::<T>(instance, Some(name), self.container.settings().conflict_policy)
    }

    pub fn named_instance_with<T: Bindable + ?Sized>(
        &self,
        instance: T::Ref,
        name: Option<&str>,
        policy: ConflictPolicy,
    ) -> BindResult {
        let binding = Binding::new::<T>(BindingId::new(T::type_key(), name), instance);
        self.container.bind_specific(binding, policy)
    }
}
