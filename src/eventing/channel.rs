//! Versioned Change Channel
//!
//! A monotonic version counter paired with a [`SubscriberMap`]. Every
//! [`bump`](VersionedChannel::bump) increments the version by exactly one and
//! delivers `(version, reason)` to every current subscriber, synchronously and
//! in registration order.
//!
//! Delivery is strictly sequential per channel: a bump raised from inside a
//! handler (or from another thread while a broadcast is running) is queued
//! and delivered after the in-flight notification has reached every
//! subscriber. No internal lock is held while a handler runs.

use super::{SubscriberMap, SubscriptionKey};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

struct ChannelState<H: ?Sized> {
    version: u64,
    subscribers: SubscriberMap<H>,
    pending: VecDeque<(u64, Arc<str>)>,
}

/// Version counter with synchronous subscriber fan-out
pub struct VersionedChannel<H: ?Sized> {
    state: Mutex<ChannelState<H>>,
    /// Serializes draining across threads; the flag marks an active drain on the owning thread
    dispatch: ReentrantMutex<Cell<bool>>,
}

/// Resets the draining flag even if a handler unwinds
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<H: ?Sized> VersionedChannel<H> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChannelState {
                version: 0,
                subscribers: SubscriberMap::new(),
                pending: VecDeque::new(),
            }),
            dispatch: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Register a handler under a fresh key
    pub fn subscribe(&self, context: &str, handler: Arc<H>) -> SubscriptionKey {
        self.state.lock().subscribers.insert(context, handler)
    }

    /// Register a handler unless the same handler is already registered
    pub fn subscribe_unique(&self, context: &str, handler: Arc<H>) -> (SubscriptionKey, bool) {
        self.state.lock().subscribers.insert_unique(context, handler)
    }

    pub fn unsubscribe(&self, key: &SubscriptionKey) -> bool {
        self.state.lock().subscribers.remove(key)
    }

    /// Drop every subscription
    pub fn clear_subscribers(&self) {
        self.state.lock().subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Increment the version and notify every subscriber
    ///
    /// `deliver` is invoked once per handler. Returns the new version.
    pub fn bump(&self, reason: impl Into<Arc<str>>, deliver: impl Fn(&H, u64, &str)) -> u64 {
        let version = {
            let mut state = self.state.lock();
            state.version += 1;
            let version = state.version;
            state.pending.push_back((version, reason.into()));
            version
        };

        let draining = self.dispatch.lock();
        if draining.replace(true) {
            // An outer broadcast on this thread delivers the queued notification.
            return version;
        }
        let _guard = DrainGuard(&*draining);

        loop {
            let next = {
                let mut state = self.state.lock();
                state
                    .pending
                    .pop_front()
                    .map(|(version, reason)| (version, reason, state.subscribers.snapshot()))
            };
            let Some((version, reason, handlers)) = next else {
                break;
            };
            for handler in handlers {
                deliver(&*handler, version, &reason);
            }
        }

        version
    }
}

impl<H: ?Sized> Default for VersionedChannel<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for VersionedChannel<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VersionedChannel")
            .field("version", &state.version)
            .field("subscribers", &state.subscribers.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}
