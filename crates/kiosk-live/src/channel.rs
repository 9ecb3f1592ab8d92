//! One broadcast topic: a registry of subscriber callbacks.
//!
//! # Delivery contract
//!
//! - `publish` snapshots the subscriber list, releases the registry lock and
//!   then invokes each callback in registration order. Callbacks may
//!   unsubscribe themselves or others while being notified.
//! - A subscriber removed before its turn in an ongoing fan-out is skipped.
//! - A callback that returns [`DeliveryError`] or panics is dropped from the
//!   channel. The failure never reaches the publisher and never stops
//!   delivery to the remaining subscribers.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use thiserror::Error;
use tracing::{debug, warn};

/// Returned by a subscriber callback that can no longer accept events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber connection closed")]
    Closed,
}

type Callback<T> = Box<dyn Fn(&T) -> Result<(), DeliveryError> + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    active: AtomicBool,
    callback: Callback<T>,
}

pub struct Channel<T> {
    name: &'static str,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Arc<Subscriber<T>>>>,
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Callbacks run outside every registry lock, so a poisoned guard only
    // means a panic elsewhere; the protected data is still consistent.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: 'static> Channel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register `callback`; it only sees values published after this call.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&T) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let sub = self.register(Box::new(callback));
        self.subscription_for(&sub)
    }

    /// Register `callback` and deliver `initial` to it before returning.
    ///
    /// If the priming delivery fails the subscriber is dropped straight away
    /// and the returned handle is inert.
    pub fn subscribe_primed<F>(self: &Arc<Self>, callback: F, initial: &T) -> Subscription
    where
        F: Fn(&T) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let sub = self.register(Box::new(callback));
        if !self.deliver(&sub, initial) {
            self.unsubscribe(sub.id);
        }
        self.subscription_for(&sub)
    }

    /// Remove subscriber `id`. Returns false when it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut subs = lock(&self.subscribers);
        match subs.iter().position(|s| s.id == id) {
            Some(pos) => {
                let sub = subs.remove(pos);
                sub.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Fan `value` out to every active subscriber. Returns how many accepted it.
    pub fn publish(&self, value: &T) -> usize {
        let snapshot: Vec<Arc<Subscriber<T>>> = lock(&self.subscribers).clone();

        let mut delivered = 0;
        for sub in &snapshot {
            if !sub.active.load(Ordering::SeqCst) {
                continue;
            }
            if self.deliver(sub, value) {
                delivered += 1;
            } else {
                self.unsubscribe(sub.id);
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        lock(&self.subscribers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&self, callback: Callback<T>) -> Arc<Subscriber<T>> {
        let sub = Arc::new(Subscriber {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            callback,
        });
        lock(&self.subscribers).push(Arc::clone(&sub));
        debug!(channel = self.name, subscriber = sub.id, "subscribed");
        sub
    }

    fn deliver(&self, sub: &Subscriber<T>, value: &T) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (sub.callback)(value))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                debug!(channel = self.name, subscriber = sub.id, %err, "dropping subscriber");
                false
            }
            Err(_) => {
                warn!(
                    channel = self.name,
                    subscriber = sub.id,
                    "subscriber callback panicked; dropping subscriber"
                );
                false
            }
        }
    }

    fn subscription_for(self: &Arc<Self>, sub: &Subscriber<T>) -> Subscription {
        let channel: Weak<Channel<T>> = Arc::downgrade(self);
        let id = sub.id;
        Subscription {
            channel: self.name,
            id,
            cancel: Some(Box::new(move || {
                if let Some(ch) = channel.upgrade() {
                    if ch.unsubscribe(id) {
                        debug!(channel = ch.name, subscriber = id, "unsubscribed");
                    }
                }
            })),
        }
    }
}

/// Disposer for one registration. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    channel: &'static str,
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&self) -> &'static str {
        self.channel
    }

    /// Explicit form of dropping the handle.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) -> Result<(), DeliveryError>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move |_: &u32| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn closed_subscriber_is_dropped_and_others_still_receive() {
        let ch = Arc::new(Channel::<u32>::new("test"));
        let _dead = ch.subscribe(|_| Err(DeliveryError::Closed));
        let (hits, cb) = counter();
        let _live = ch.subscribe(cb);

        assert_eq!(ch.publish(&1), 1);
        assert_eq!(ch.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let ch = Arc::new(Channel::<u32>::new("test"));
        let _bad = ch.subscribe(|_| panic!("boom"));
        let (hits, cb) = counter();
        let _good = ch.subscribe(cb);

        assert_eq!(ch.publish(&7), 1);
        assert_eq!(ch.publish(&8), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(ch.len(), 1);
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let ch = Arc::new(Channel::<u32>::new("test"));
        let (hits, cb) = counter();
        let sub = ch.subscribe(cb);
        drop(sub);
        assert!(ch.is_empty());
        assert_eq!(ch.publish(&1), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_outliving_channel_is_harmless() {
        let ch = Arc::new(Channel::<u32>::new("test"));
        let sub = ch.subscribe(|_| Ok(()));
        drop(ch);
        sub.unsubscribe();
    }

    #[test]
    fn failed_priming_leaves_no_registration() {
        let ch = Arc::new(Channel::<u32>::new("test"));
        let sub = ch.subscribe_primed(|_| Err(DeliveryError::Closed), &0);
        assert!(ch.is_empty());
        drop(sub);
    }
}
