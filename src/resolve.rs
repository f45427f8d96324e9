use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use crate::binding::{Bindable, Binding};
use crate::binding_id::BindingId;
use crate::container::Container;
use crate::future::Future;
use crate::host::HostObject;
use crate::policy::{handle_canceled_wait, handle_resolve_error, ResolveErrorPolicy};
use crate::promise::Promise;
use crate::subscription::Subscriber;

/// Options for one lookup.
#[derive(Clone, Default)]
pub struct Lookup {
    name: Option<Arc<str>>,
    owner: Option<Weak<dyn HostObject>>,
    policy: Option<ResolveErrorPolicy>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Ties an asynchronous wait to `owner`. If the owner is gone when the
    /// binding appears, the wait is canceled instead of fulfilled.
    pub fn owned_by<O: HostObject>(mut self, owner: &Arc<O>) -> Self {
        let owner: Weak<O> = Arc::downgrade(owner);
        self.owner = Some(owner);
        self
    }

    pub fn on_error(mut self, policy: ResolveErrorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup")
            .field("name", &self.name)
            .field("owned", &self.owner.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Typed lookups against a container. Misses are reported through the
/// lookup's resolve-error policy, or the container's default one.
pub struct Resolver<'a, C: Container + ?Sized> {
    container: &'a C,
}

impl<'a, C: Container + ?Sized> Resolver<'a, C> {
    pub fn new(container: &'a C) -> Self {
        Self { container }
    }

    fn id_for<T: Bindable + ?Sized>(lookup: &Lookup) -> BindingId {
        BindingId::new(T::type_key(), lookup.name.as_deref())
    }

    fn policy_for(&self, lookup: &Lookup) -> ResolveErrorPolicy {
        lookup
            .policy
            .unwrap_or(self.container.settings().resolve_error_policy)
    }

    fn find<T: Bindable + ?Sized>(&self, id: &BindingId) -> Option<T::Ref> {
        self.container
            .find_binding(id)
            .and_then(|binding| binding.resolve::<T>())
    }

    pub fn try_get<T: Bindable + ?Sized>(&self) -> Option<T::Ref> {
        self.try_get_with::<T>(&Lookup::new())
    }

    pub fn try_get_named<T: Bindable + ?Sized>(&self, name: &str) -> Option<T::Ref> {
        self.try_get_with::<T>(&Lookup::new().named(name))
    }

    pub fn try_get_with<T: Bindable + ?Sized>(&self, lookup: &Lookup) -> Option<T::Ref> {
        let id = Self::id_for::<T>(lookup);
        let found = self.find::<T>(&id);
        if found.is_none() {
            handle_resolve_error(&id, self.policy_for(lookup), self.container.settings());
        }
        found
    }

    pub fn wait_for<T: Bindable + ?Sized>(&self) -> Future<T::Ref> {
        self.wait_for_with::<T>(&Lookup::new())
    }

    pub fn wait_for_named<T: Bindable + ?Sized>(&self, name: &str) -> Future<T::Ref> {
        self.wait_for_with::<T>(&Lookup::new().named(name))
    }

    /// A future of the binding, fulfilled at once when it is already bound
    /// and otherwise when it gets bound here or above.
    ///
    /// The future is canceled when the container is dropped first, or when
    /// the lookup's owner is gone by the time the binding appears. A canceled
    /// wait is reported through the resolve-error policy, except that
    /// `AssertCheck` only logs, since the cancel may come from a container
    /// being dropped.
    pub fn wait_for_with<T: Bindable + ?Sized>(&self, lookup: &Lookup) -> Future<T::Ref> {
        let id = Self::id_for::<T>(lookup);
        let (promise, future) = Promise::<T::Ref>::pair();
        match self.find::<T>(&id) {
            Some(instance) => promise.set_value(instance),
            None => {
                let fulfill = move |binding: &Binding| match binding.resolve::<T>() {
                    Some(instance) => promise.set_value(instance),
                    None => promise.cancel(),
                };
                let subscriber = match &lookup.owner {
                    Some(owner) => Subscriber::owned_by(owner.clone(), fulfill),
                    None => Subscriber::new(fulfill),
                };
                self.container.subscribe(id.clone(), subscriber);
                self.container.retry_pending_wait(&id);
            }
        }

        let policy = self.policy_for(lookup);
        let settings = self.container.settings().clone();
        let (resolved, resolved_future) = Promise::pair();
        let _ = future.next(move |instance| match instance {
            Some(instance) => resolved.set_value(instance),
            None => {
                handle_canceled_wait(&id, policy, &settings);
                resolved.cancel();
            }
        });
        resolved_future
    }
}

/// Resolves several types at once into a tuple of options.
///
/// ```
/// use promise_di::{declare_native_type, try_get_many, ChainedContainer};
/// use std::sync::Arc;
///
/// struct Width(u32);
/// struct Height(u32);
/// declare_native_type!(Width);
/// declare_native_type!(Height);
///
/// let container = ChainedContainer::new();
/// container.bind().instance::<Width>(Arc::new(Width(4)));
/// let (width, height) = try_get_many!(container.resolve(), Width, Height);
/// assert_eq!(width.map(|w| w.0), Some(4));
/// assert!(height.is_none());
/// ```
#[macro_export]
macro_rules! try_get_many {
    ($resolver:expr, $($ty:ty),+ $(,)?) => {{
        let resolver = $resolver;
        ($(resolver.try_get::<$ty>(),)+)
    }};
}

/// Waits for several types at once, see [`await_all!`](crate::await_all).
#[macro_export]
macro_rules! wait_for_many {
    ($resolver:expr, $($ty:ty),+ $(,)?) => {{
        let resolver = $resolver;
        $crate::join::await_all_in_tuple(($(resolver.wait_for::<$ty>(),)+))
    }};
}
