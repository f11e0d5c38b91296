//! State containers.
//!
//! A [`StateContext`] is a namespaced mutable key/value store backing one
//! subtree's local state. Mutation optionally notifies subscribers, always
//! synchronously: every subscriber runs before the mutating call returns.
//! Containers link toward the origin (root) container, supporting
//! nearest-ancestor lookup by namespace.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{Listeners, ListenerId, ScopeValue};

/// A namespaced key/value store with subscriber notification.
pub struct StateContext {
    namespace: String,
    state_id: Uuid,
    values: Mutex<IndexMap<String, ScopeValue>>,
    subscribers: Listeners,
    parent: Option<Arc<StateContext>>,
}

impl StateContext {
    /// Create a root container (its own origin).
    pub fn root(
        namespace: impl Into<String>,
        initial: impl IntoIterator<Item = (String, ScopeValue)>,
    ) -> Arc<Self> {
        Self::create(namespace, initial, None)
    }

    /// Create a container linked under an existing ancestor chain.
    pub fn child_of(
        parent: Arc<StateContext>,
        namespace: impl Into<String>,
        initial: impl IntoIterator<Item = (String, ScopeValue)>,
    ) -> Arc<Self> {
        Self::create(namespace, initial, Some(parent))
    }

    fn create(
        namespace: impl Into<String>,
        initial: impl IntoIterator<Item = (String, ScopeValue)>,
        parent: Option<Arc<StateContext>>,
    ) -> Arc<Self> {
        let namespace = namespace.into();
        let context = Arc::new(Self {
            state_id: Uuid::new_v4(),
            values: Mutex::new(initial.into_iter().collect()),
            subscribers: Listeners::new(),
            parent,
            namespace,
        });
        tracing::debug!(
            namespace = %context.namespace,
            state_id = %context.state_id,
            "created state context"
        );
        context
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Per-instance unique id.
    pub fn state_id(&self) -> Uuid {
        self.state_id
    }

    /// Current value for a key, if present.
    pub fn get_value(&self, key: &str) -> Option<ScopeValue> {
        self.values.lock().expect("state values poisoned").get(key).cloned()
    }

    /// All current keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.values.lock().expect("state values poisoned").keys().cloned().collect()
    }

    /// Merge one value; notify subscribers when `notify` is set.
    pub fn set_value(&self, key: impl Into<String>, value: ScopeValue, notify: bool) {
        self.values.lock().expect("state values poisoned").insert(key.into(), value);
        if notify {
            self.trigger_listeners();
        }
    }

    /// Merge a batch of values; subscribers are notified once at the end
    /// when `notify` is set.
    pub fn set_values(
        &self,
        updates: impl IntoIterator<Item = (String, ScopeValue)>,
        notify: bool,
    ) {
        {
            let mut values = self.values.lock().expect("state values poisoned");
            for (key, value) in updates {
                values.insert(key, value);
            }
        }
        if notify {
            self.trigger_listeners();
        }
    }

    /// Invoke subscribers without changing values. Used by rebuild actions
    /// to force a re-render after an external mutation bypassed
    /// `set_value`.
    pub fn trigger_listeners(&self) {
        tracing::trace!(namespace = %self.namespace, "notifying state subscribers");
        self.subscribers.notify();
    }

    /// Register a subscriber, invoked synchronously on every notification.
    pub fn subscribe(&self, subscriber: impl Fn() + Send + Sync + 'static) -> ListenerId {
        self.subscribers.add(subscriber)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.subscribers.remove(id);
    }

    /// The nearest context along the origin chain (starting with this one)
    /// whose namespace matches, or none.
    pub fn find_ancestor_context(self: &Arc<Self>, namespace: &str) -> Option<Arc<StateContext>> {
        let mut current = Some(Arc::clone(self));
        while let Some(context) = current {
            if context.namespace == namespace {
                return Some(context);
            }
            current = context.parent.clone();
        }
        None
    }

    /// The root of the ancestor chain. A root container is its own origin.
    pub fn origin_context(self: &Arc<Self>) -> Arc<StateContext> {
        let mut current = Arc::clone(self);
        while let Some(parent) = current.parent.clone() {
            current = parent;
        }
        current
    }
}

impl std::fmt::Debug for StateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContext")
            .field("namespace", &self.namespace)
            .field("state_id", &self.state_id)
            .field("keys", &self.keys())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
