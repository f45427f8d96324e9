//! Binding registries and the ways they connect.
//!
//! Containers only ever hold [`Weak`] links to each other; their lifetime is
//! up to whoever owns the `Arc`. A link whose container is gone is pruned the
//! next time it is walked.
//!
//! ```text
//!   parent (Chained) ──┐        lookups walk up:   child → fork → parents
//!   other  (Chained) ──┤ ForkingContainer
//!                      └── child (Chained)   binds flow down: parent → fork → child
//! ```

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::binding::Binding;
use crate::binding_id::BindingId;
use crate::config::Settings;
use crate::policy::{BindResult, ConflictPolicy};
use crate::subscription::{Subscriber, SubscriptionHandle};

pub mod chained;
pub mod forking;

pub use chained::ChainedContainer;
pub use forking::ForkingContainer;

/// A node of the container hierarchy.
pub trait ConnectedContainer: Send + Sync {
    /// Registers `child` for bind notifications and lets it retry its
    /// pending waits against this container.
    fn try_connect_subcontainer(&self, child: Arc<dyn ConnectedContainer>) -> bool;

    fn try_disconnect_subcontainer(&self, child: &Arc<dyn ConnectedContainer>) -> bool;

    /// Called when `binding` appeared in this container or above it.
    fn notify_instance_bound(&self, binding: &Arc<Binding>);

    /// Fires every pending wait that can now be resolved, then asks the
    /// children to do the same.
    fn retry_all_pending_waits(&self);

    /// Looks up `id` in this container and, failing that, above it.
    fn find_connected_binding(&self, id: &BindingId) -> Option<Arc<Binding>>;
}

/// A container that stores bindings and pending waits.
pub trait Container: Send + Sync {
    fn bind_specific(&self, binding: Binding, policy: ConflictPolicy) -> BindResult;

    /// The valid binding for `id` here or in the parent chain.
    fn find_binding(&self, id: &BindingId) -> Option<Arc<Binding>>;

    /// Adds a one-shot subscriber for `id`. It never fires for an id that is
    /// already bound, see [`Container::retry_pending_wait`].
    fn subscribe(&self, id: BindingId, subscriber: Subscriber) -> SubscriptionHandle;

    fn unsubscribe(&self, id: &BindingId, handle: SubscriptionHandle) -> bool;

    /// Fires the pending waits for `id` if it can be resolved now.
    fn retry_pending_wait(&self, id: &BindingId);

    fn settings(&self) -> &Settings;

    fn downgrade(&self) -> Weak<dyn Container>;
}

/// Whether `link` points at the same container as `container`.
pub(crate) fn same_container(link: &Weak<dyn ConnectedContainer>, container: &Arc<dyn ConnectedContainer>) -> bool {
    std::ptr::addr_eq(link.as_ptr(), Arc::as_ptr(container))
}

/// Weak links to the containers that receive bind notifications.
#[derive(Default)]
pub(crate) struct ChildLinks {
    links: Mutex<Vec<Weak<dyn ConnectedContainer>>>,
}

impl ChildLinks {
    pub(crate) fn add(&self, child: &Arc<dyn ConnectedContainer>) {
        let mut links = self.links.lock();
        if !links.iter().any(|link| same_container(link, child)) {
            links.push(Arc::downgrade(child));
        }
    }

    pub(crate) fn remove(&self, child: &Arc<dyn ConnectedContainer>) -> bool {
        let mut links = self.links.lock();
        let before = links.len();
        links.retain(|link| !same_container(link, child));
        links.len() != before
    }

    /// The children still alive, pruning the rest.
    pub(crate) fn live(&self) -> Vec<Arc<dyn ConnectedContainer>> {
        let mut links = self.links.lock();
        let mut live = Vec::with_capacity(links.len());
        links.retain(|link| match link.upgrade() {
            Some(child) => {
                live.push(child);
                true
            }
            None => false,
        });
        live
    }

    pub(crate) fn len(&self) -> usize {
        self.links.lock().len()
    }
}
