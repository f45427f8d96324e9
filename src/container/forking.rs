use parking_lot::Mutex;
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use super::{same_container, ChildLinks, ConnectedContainer};
use crate::binding::Binding;
use crate::binding_id::BindingId;

struct PrioritizedParent {
    priority: i32,
    container: Weak<dyn ConnectedContainer>,
}

/// A container without bindings of its own that searches several parents.
///
/// Parents are searched highest priority first; parents with equal priority
/// are searched in the order they were added. Bind notifications from any
/// parent are passed on to the children.
pub struct ForkingContainer {
    this: Weak<ForkingContainer>,
    parents: Mutex<Vec<PrioritizedParent>>,
    children: ChildLinks,
}

impl ForkingContainer {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            parents: Mutex::new(Vec::new()),
            children: ChildLinks::default(),
        })
    }

    fn connected(&self) -> Option<Arc<dyn ConnectedContainer>> {
        let this: Arc<dyn ConnectedContainer> = self.this.upgrade()?;
        Some(this)
    }

    /// Adds `parent`, or moves it to `priority` if it is already a parent.
    pub fn add_parent(&self, parent: Arc<dyn ConnectedContainer>, priority: i32) {
        let Some(this) = self.connected() else {
            return;
        };
        {
            let mut parents = self.parents.lock();
            parents.retain(|known| !same_container(&known.container, &parent));
            parents.push(PrioritizedParent {
                priority,
                container: Arc::downgrade(&parent),
            });
            parents.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        if !parent.try_connect_subcontainer(this) {
            tracing::error!(priority, "failed to connect to the parent container");
        }
    }

    pub fn remove_parent(&self, parent: Arc<dyn ConnectedContainer>) -> bool {
        let removed = {
            let mut parents = self.parents.lock();
            let before = parents.len();
            parents.retain(|known| !same_container(&known.container, &parent));
            parents.len() != before
        };
        if removed {
            if let Some(this) = self.connected() {
                if !parent.try_disconnect_subcontainer(&this) {
                    tracing::warn!("failed to disconnect from a parent container");
                }
            }
        }
        removed
    }

    /// The live parents in search order, pruning the rest.
    pub fn parents(&self) -> Vec<Arc<dyn ConnectedContainer>> {
        let mut parents = self.parents.lock();
        let mut live = Vec::with_capacity(parents.len());
        parents.retain(|parent| match parent.container.upgrade() {
            Some(container) => {
                live.push(container);
                true
            }
            None => false,
        });
        live
    }
}

impl ConnectedContainer for ForkingContainer {
    fn try_connect_subcontainer(&self, child: Arc<dyn ConnectedContainer>) -> bool {
        self.children.add(&child);
        child.retry_all_pending_waits();
        true
    }

    fn try_disconnect_subcontainer(&self, child: &Arc<dyn ConnectedContainer>) -> bool {
        self.children.remove(child)
    }

    fn notify_instance_bound(&self, binding: &Arc<Binding>) {
        for child in self.children.live() {
            child.notify_instance_bound(binding);
        }
    }

    fn retry_all_pending_waits(&self) {
        for child in self.children.live() {
            child.retry_all_pending_waits();
        }
    }

    fn find_connected_binding(&self, id: &BindingId) -> Option<Arc<Binding>> {
        self.parents()
            .into_iter()
            .find_map(|parent| parent.find_connected_binding(id))
    }
}

impl Debug for ForkingContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self.parents.lock().iter().map(|parent| parent.priority).collect();
        f.debug_struct("ForkingContainer")
            .field("parent_priorities", &priorities)
            .field("children", &self.children.len())
            .finish()
    }
}
