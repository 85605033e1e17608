//! Subscriber Map
//!
//! Generation-stamped, insertion-ordered registry of notification handlers.
//! Every subscription receives a stable [`SubscriptionKey`] of the form
//! `"{context}_{generation}"`, where the generation counter never repeats for
//! the lifetime of the map (it survives [`SubscriberMap::clear`]).
//!
//! Broadcasts iterate over a [`snapshot`](SubscriberMap::snapshot) taken before
//! the first handler runs, so handlers may subscribe or unsubscribe while a
//! notification is in flight without affecting it.

use hashlink::LinkedHashMap;
use std::fmt;
use std::sync::Arc;

/// Stable key identifying one subscription
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SubscriptionKey(Arc<str>);

impl SubscriptionKey {
    /// Get the underlying string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubscriptionKey {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for SubscriptionKey {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Insertion-ordered map from subscription key to handler
pub struct SubscriberMap<H: ?Sized> {
    entries: LinkedHashMap<SubscriptionKey, Arc<H>>,
    generation: u64,
}

impl<H: ?Sized> SubscriberMap<H> {
    pub fn new() -> Self {
        Self {
            entries: LinkedHashMap::new(),
            generation: 0,
        }
    }

    /// Register a handler under a fresh key derived from `context`
    pub fn insert(&mut self, context: &str, handler: Arc<H>) -> SubscriptionKey {
        self.generation += 1;
        let key = SubscriptionKey::from(format!("{context}_{}", self.generation));
        self.entries.insert(key.clone(), handler);
        key
    }

    /// Register a handler unless the very same handler is already present
    ///
    /// Returns the key and whether a new entry was created.
    pub fn insert_unique(&mut self, context: &str, handler: Arc<H>) -> (SubscriptionKey, bool) {
        if let Some(key) = self.key_of(&handler) {
            return (key, false);
        }
        (self.insert(context, handler), true)
    }

    /// Find the key under which `handler` is registered
    pub fn key_of(&self, handler: &Arc<H>) -> Option<SubscriptionKey> {
        self.entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, handler))
            .map(|(key, _)| key.clone())
    }

    /// Remove a subscription, returning whether it existed
    pub fn remove(&mut self, key: &SubscriptionKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Clone the current handlers in registration order
    pub fn snapshot(&self) -> Vec<Arc<H>> {
        self.entries.values().cloned().collect()
    }

    /// Drop all subscriptions; the generation counter keeps counting
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: ?Sized> Default for SubscriberMap<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for SubscriberMap<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberMap")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("generation", &self.generation)
            .finish()
    }
}
