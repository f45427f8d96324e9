use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use super::{same_container, ChildLinks, ConnectedContainer, Container};
use crate::bind::Binder;
use crate::binding::Binding;
use crate::binding_id::BindingId;
use crate::config::Settings;
use crate::future::Future;
use crate::host::ReferenceCollector;
use crate::inject::AfterAsyncInject;
use crate::policy::{handle_bind_conflict, BindResult, ConflictPolicy};
use crate::resolve::Resolver;
use crate::subscription::{notify_all, Subscriber, SubscriptionHandle, SubscriptionList};

/// A container with its own bindings and at most one parent.
///
/// Lookups that miss here go to the parent. Bindings made here, or
/// announced by the parent, are passed on to the children.
///
/// # Examples
///
/// ```
/// use promise_di::{declare_native_type, ChainedContainer};
/// use std::sync::Arc;
///
/// struct Config(u32);
/// declare_native_type!(Config);
///
/// let parent = ChainedContainer::new();
/// let child = ChainedContainer::new();
/// child.set_parent(parent.clone());
///
/// let pending = child.resolve().wait_for::<Config>();
/// parent.bind().instance::<Config>(Arc::new(Config(7)));
/// assert_eq!(pending.consume().map(|config| config.0), Some(7));
/// ```
pub struct ChainedContainer {
    this: Weak<ChainedContainer>,
    settings: Settings,
    bindings: RwLock<HashMap<BindingId, Arc<Binding>>>,
    subscriptions: Mutex<SubscriptionList>,
    parent: Mutex<Option<Weak<dyn ConnectedContainer>>>,
    children: ChildLinks,
}

impl ChainedContainer {
    pub fn new() -> Arc<Self> {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            settings,
            bindings: RwLock::new(HashMap::new()),
            subscriptions: Mutex::new(SubscriptionList::new()),
            parent: Mutex::new(None),
            children: ChildLinks::default(),
        })
    }

    pub fn bind(&self) -> Binder<'_, Self> {
        Binder::new(self)
    }

    pub fn resolve(&self) -> Resolver<'_, Self> {
        Resolver::new(self)
    }

    /// Continues an [`inject_async!`](crate::inject_async) with a bind into
    /// this container.
    pub fn after_inject<R: Send + 'static>(&self, future: Future<R>) -> AfterAsyncInject<R> {
        AfterAsyncInject::new(self, future)
    }

    /// Replaces the parent. The old parent stops notifying this container
    /// and the new one is asked right away for anything still pending here.
    pub fn set_parent(&self, parent: Arc<dyn ConnectedContainer>) {
        self.replace_parent(Some(parent));
    }

    pub fn clear_parent(&self) {
        self.replace_parent(None);
    }

    /// The parent if it is still alive. A dead parent link is cleared.
    pub fn parent(&self) -> Option<Arc<dyn ConnectedContainer>> {
        let mut link = self.parent.lock();
        let parent = link.as_ref().and_then(Weak::upgrade);
        if parent.is_none() {
            *link = None;
        }
        parent
    }

    fn connected(&self) -> Option<Arc<dyn ConnectedContainer>> {
        let this: Arc<dyn ConnectedContainer> = self.this.upgrade()?;
        Some(this)
    }

    fn replace_parent(&self, parent: Option<Arc<dyn ConnectedContainer>>) {
        let Some(this) = self.connected() else {
            return;
        };
        let old = {
            let mut current = self.parent.lock();
            if let (Some(link), Some(parent)) = (current.as_ref(), parent.as_ref()) {
                if same_container(link, parent) {
                    return;
                }
            }
            std::mem::replace(&mut *current, parent.as_ref().map(Arc::downgrade))
        };
        if let Some(old) = old.and_then(|link| link.upgrade()) {
            if !old.try_disconnect_subcontainer(&this) {
                tracing::warn!("failed to disconnect from the previous parent container");
            }
        }
        if let Some(parent) = parent {
            if !parent.try_connect_subcontainer(this) {
                tracing::error!("failed to connect to the parent container");
            }
        }
    }

    /// Hands every strong reference held by the bindings to `collector`.
    pub fn add_referenced_objects(&self, collector: &mut dyn ReferenceCollector) {
        for binding in self.bindings.read().values() {
            binding.trace(collector);
        }
    }

    /// Number of subscribers still waiting here.
    pub fn pending_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    fn notify_pending(&self, binding: &Binding) {
        let subscribers = self.subscriptions.lock().take(binding.id());
        if !subscribers.is_empty() {
            tracing::debug!(id = %binding.id(), count = subscribers.len(), "notifying pending waits");
            notify_all(subscribers, binding);
        }
    }
}

impl ConnectedContainer for ChainedContainer {
    fn try_connect_subcontainer(&self, child: Arc<dyn ConnectedContainer>) -> bool {
        self.children.add(&child);
        child.retry_all_pending_waits();
        true
    }

    fn try_disconnect_subcontainer(&self, child: &Arc<dyn ConnectedContainer>) -> bool {
        self.children.remove(child)
    }

    fn notify_instance_bound(&self, binding: &Arc<Binding>) {
        self.notify_pending(binding);
        for child in self.children.live() {
            child.notify_instance_bound(binding);
        }
    }

    fn retry_all_pending_waits(&self) {
        let pending = self.subscriptions.lock().pending_ids();
        for id in pending {
            self.retry_pending_wait(&id);
        }
        for child in self.children.live() {
            child.retry_all_pending_waits();
        }
    }

    fn find_connected_binding(&self, id: &BindingId) -> Option<Arc<Binding>> {
        self.find_binding(id)
    }
}

impl Container for ChainedContainer {
    fn bind_specific(&self, binding: Binding, policy: ConflictPolicy) -> BindResult {
        let binding = Arc::new(binding);
        let id = binding.id().clone();
        let conflict = {
            let mut bindings = self.bindings.write();
            let live = bindings.get(&id).is_some_and(|existing| existing.is_valid());
            if live && policy != ConflictPolicy::Overwrite {
                true
            } else {
                if live {
                    tracing::debug!(%id, "overwriting binding");
                }
                bindings.insert(id.clone(), Arc::clone(&binding));
                false
            }
        };
        if conflict {
            handle_bind_conflict(&id, policy, &self.settings);
            return BindResult::Conflict;
        }
        tracing::debug!(%id, kind = ?binding.kind(), "bound instance");
        self.notify_instance_bound(&binding);
        BindResult::Bound
    }

    fn find_binding(&self, id: &BindingId) -> Option<Arc<Binding>> {
        let own = self.bindings.read().get(id).filter(|binding| binding.is_valid()).cloned();
        if own.is_some() {
            return own;
        }
        self.parent()?.find_connected_binding(id)
    }

    fn subscribe(&self, id: BindingId, subscriber: Subscriber) -> SubscriptionHandle {
        self.subscriptions.lock().subscribe_once(id, subscriber)
    }

    fn unsubscribe(&self, id: &BindingId, handle: SubscriptionHandle) -> bool {
        let removed = self.subscriptions.lock().unsubscribe(id, handle);
        removed.is_some()
    }

    fn retry_pending_wait(&self, id: &BindingId) {
        if let Some(binding) = self.find_binding(id) {
            self.notify_pending(&binding);
        }
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn downgrade(&self) -> Weak<dyn Container> {
        let this: Weak<dyn Container> = self.this.clone();
        this
    }
}

impl Debug for ChainedContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedContainer")
            .field("bindings", &self.bindings.read().len())
            .field("pending", &self.pending_count())
            .field("has_parent", &self.parent().is_some())
            .field("children", &self.children.len())
            .finish()
    }
}
