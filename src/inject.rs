//! Calling code with resolved dependencies.
//!
//! [`inject!`](crate::inject) resolves its arguments right away and calls the
//! body only when all of them are bound. [`inject_async!`](crate::inject_async)
//! waits for every argument and runs the body once the last one arrives; the
//! returned future can then feed a bind through [`AfterAsyncInject`].
//!
//! ```
//! use promise_di::{declare_native_type, inject, inject_async, ChainedContainer};
//! use std::sync::Arc;
//!
//! struct Name(&'static str);
//! struct Greeting(String);
//! declare_native_type!(Name);
//! declare_native_type!(Greeting);
//!
//! let container = ChainedContainer::new();
//! let greeting = inject_async!(container.resolve(), move |name: Name| {
//!     Greeting(format!("hello {}", name.0))
//! });
//! container.bind().instance::<Name>(Arc::new(Name("world")));
//! assert_eq!(greeting.consume().map(|g| g.0).as_deref(), Some("hello world"));
//!
//! let length = inject!(container.resolve(), |name: Name| name.0.len());
//! assert_eq!(length, Some(5));
//! ```

use std::sync::Weak;

use crate::binding::{Bindable, Binding};
use crate::binding_id::BindingId;
use crate::container::Container;
use crate::future::Future;
use crate::policy::{BindResult, ConflictPolicy};
use crate::promise::Promise;

/// Resolves each typed argument and evaluates the body with them, yielding
/// `Some(body)` or `None` when an argument is not bound. Misses go through
/// the resolve-error policy.
#[macro_export]
macro_rules! inject {
    ($resolver:expr, |$($arg:ident : $ty:ty),+ $(,)?| $body:expr) => {{
        let resolver = $resolver;
        match ($(resolver.try_get::<$ty>(),)+) {
            ($(::core::option::Option::Some($arg),)+) => ::core::option::Option::Some($body),
            #[allow(unreachable_patterns)]
            _ => ::core::option::Option::None,
        }
    }};
}

/// Waits for each typed argument and evaluates the body once all are bound,
/// returning a [`Future`](crate::Future) of the body's value. The future is
/// canceled if any wait is canceled.
#[macro_export]
macro_rules! inject_async {
    ($resolver:expr, move |$($arg:ident : $ty:ty),+ $(,)?| $body:expr) => {{
        let resolver = $resolver;
        $crate::join::await_all_in_tuple(($(resolver.wait_for::<$ty>(),)+))
            .and_then_expand(move |($($arg,)+)| $body)
    }};
}

/// Binds an instance once an asynchronous injection has completed.
///
/// The container is held weakly: if it is dropped first, or the injection is
/// canceled, nothing is bound and the returned future is canceled.
pub struct AfterAsyncInject<R> {
    container: Weak<dyn Container>,
    future: Future<R>,
}

impl<R: Send + 'static> AfterAsyncInject<R> {
    pub fn new<C: Container + ?Sized>(container: &C, future: Future<R>) -> Self {
        Self {
            container: container.downgrade(),
            future,
        }
    }

    pub fn into_future(self) -> Future<R> {
        self.future
    }

    pub fn then_bind_instance<T: Bindable + ?Sized>(self, instance: T::Ref, policy: ConflictPolicy) -> Future<BindResult> {
        self.then_bind_named_instance::<T>(instance, None, policy)
    }

    pub fn then_bind_named_instance<T: Bindable + ?Sized>(
        self,
        instance: T::Ref,
        name: Option<&str>,
        policy: ConflictPolicy,
    ) -> Future<BindResult> {
        let id = BindingId::new(T::type_key(), name);
        let container = self.container;
        let (promise, future) = Promise::pair();
        let _ = self.future.next(move |injected| {
            let Some(container) = injected.and_then(|_| container.upgrade()) else {
                promise.cancel();
                return;
            };
            let binding = Binding::new::<T>(id, instance);
            if binding.is_valid() {
                promise.set_value(container.bind_specific(binding, policy));
            } else {
                promise.cancel();
            }
        });
        future
    }
}

impl<R> std::fmt::Debug for AfterAsyncInject<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfterAsyncInject")
            .field("container_alive", &(self.container.strong_count() > 0))
            .field("future", &self.future)
            .finish()
    }
}

