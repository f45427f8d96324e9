use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Weak;

use crate::binding::Binding;
use crate::binding_id::BindingId;
use crate::host::HostObject;

/// Identifies one subscription for [`SubscriptionList::unsubscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// A one-shot handler waiting for a binding to appear.
pub struct Subscriber {
    owner: Option<Weak<dyn HostObject>>,
    handler: Box<dyn FnOnce(&Binding) + Send>,
}

impl Subscriber {
    pub fn new(handler: impl FnOnce(&Binding) + Send + 'static) -> Self {
        Self {
            owner: None,
            handler: Box::new(handler),
        }
    }

    /// A handler that is dropped instead of run when `owner` is gone by the
    /// time the binding appears.
    pub fn owned_by(owner: Weak<dyn HostObject>, handler: impl FnOnce(&Binding) + Send + 'static) -> Self {
        Self {
            owner: Some(owner),
            handler: Box::new(handler),
        }
    }

    fn owner_alive(&self) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => owner.upgrade().is_some_and(|owner| owner.is_alive()),
        }
    }

    /// Runs the handler, unless its owner died.
    pub fn notify(self, binding: &Binding) {
        if self.owner_alive() {
            (self.handler)(binding);
        } else {
            tracing::trace!(id = %binding.id(), "subscriber owner gone, dropping handler");
        }
    }
}

impl Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("owned", &self.owner.is_some())
            .finish_non_exhaustive()
    }
}

/// Pending waiters per binding id. Each subscriber fires at most once and is
/// removed when taken for notification or unsubscribed.
#[derive(Debug, Default)]
pub struct SubscriptionList {
    pending: HashMap<BindingId, Vec<(SubscriptionHandle, Subscriber)>>,
    next_handle: u64,
}

impl SubscriptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_once(&mut self, id: BindingId, subscriber: Subscriber) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.entry(id).or_default().push((handle, subscriber));
        handle
    }

    /// Removes one pending subscription and hands it back, so the caller can
    /// drop it after releasing its lock.
    pub fn unsubscribe(&mut self, id: &BindingId, handle: SubscriptionHandle) -> Option<Subscriber> {
        let subscribers = self.pending.get_mut(id)?;
        let position = subscribers.iter().position(|(known, _)| *known == handle)?;
        let (_, removed) = subscribers.remove(position);
        if subscribers.is_empty() {
            self.pending.remove(id);
        }
        Some(removed)
    }

    /// Removes and returns every subscriber waiting on `id`, in subscription
    /// order. The caller notifies them after releasing its lock.
    pub fn take(&mut self, id: &BindingId) -> Vec<Subscriber> {
        self.pending
            .remove(id)
            .map(|subscribers| subscribers.into_iter().map(|(_, subscriber)| subscriber).collect())
            .unwrap_or_default()
    }

    pub fn pending_ids(&self) -> Vec<BindingId> {
        self.pending.keys().cloned().collect()
    }

    pub fn is_pending(&self, id: &BindingId) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of pending subscribers across all ids.
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Notifies every subscriber in order.
pub fn notify_all(subscribers: Vec<Subscriber>, binding: &Binding) {
    for subscriber in subscribers {
        subscriber.notify(binding);
    }
}
