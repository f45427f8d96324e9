//! Cancellation-aware promises and a hierarchical binding registry.
//!
//! A [`Promise`] and its [`Future`] share one outcome that completes exactly
//! once, either with a value or canceled. Dropping the last promise of an
//! unfulfilled outcome cancels it. Continuations attached to a future run on
//! the thread that completes it; nothing here spawns threads or schedules
//! work.
//!
//! Containers store bindings keyed by [`BindingId`]. A lookup that cannot be
//! satisfied yet hands back a future that is fulfilled when the binding
//! appears anywhere up the container hierarchy.

pub mod bind;
pub mod binding;
pub mod binding_id;
pub mod config;
pub mod container;
mod error;
pub mod future;
pub mod host;
pub mod inject;
pub mod join;
pub mod policy;
pub mod promise;
pub mod resolve;
pub mod shared;
mod state;
pub mod subscription;
pub mod type_id;

pub use bind::Binder;
pub use binding::{Bindable, Binding, BindingInstance, BindingKind, InterfaceRef};
pub use binding_id::BindingId;
pub use config::Settings;
pub use container::{ChainedContainer, ConnectedContainer, Container, ForkingContainer};
pub use error::Error;
pub use future::Future;
pub use host::{HostObject, ReferenceCollector, Trace};
pub use inject::AfterAsyncInject;
pub use join::{await_all_in_tuple, await_all_in_tuple_or_default, await_all_iter, FutureSet, PromiseSet};
pub use policy::{BindResult, ConflictPolicy, ResolveErrorPolicy, ScriptExceptionHandler};
pub use promise::Promise;
pub use resolve::{Lookup, Resolver};
pub use shared::SharedFuture;
pub use subscription::{Subscriber, SubscriptionHandle, SubscriptionList};
pub use type_id::{TypeIdentity, TypeKey};
