//! Push-based live snapshots.
//!
//! A [`Feed`] fans out snapshots to subscribers keyed by what they watch
//! (a user's profile, a user's meals for one date). A [`Subscription`]
//! receives every snapshot published after it was opened, starting with
//! the current one. It cannot be restarted; dropping it unsubscribes.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Weak};

/// Receiving end of a live feed
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Receiver<T>,
    // the feed holds a weak handle; dropping this marks the subscriber dead
    _alive: Arc<()>,
}

impl<T> Subscription<T> {
    /// Next pending snapshot, without blocking
    pub fn try_next(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything pending and keep only the newest snapshot
    pub fn latest(&self) -> Option<T> {
        let mut newest = None;
        while let Some(snapshot) = self.try_next() {
            newest = Some(snapshot);
        }
        newest
    }
}

#[derive(Debug)]
struct Subscriber<T> {
    tx: Sender<T>,
    alive: Weak<()>,
}

impl<T> Subscriber<T> {
    fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// Publisher side, one subscriber list per key
#[derive(Debug)]
pub struct Feed<K, T> {
    subscribers: HashMap<K, Vec<Subscriber<T>>>,
}

impl<K, T> Default for Feed<K, T> {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, T: Clone> Feed<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a subscription and deliver `current` to it immediately
    pub fn subscribe(&mut self, key: K, current: T) -> Subscription<T> {
        self.prune();

        let (tx, rx) = channel();
        let alive = Arc::new(());
        // receiver is alive, the send cannot fail
        let _ = tx.send(current);
        self.subscribers.entry(key).or_default().push(Subscriber {
            tx,
            alive: Arc::downgrade(&alive),
        });
        Subscription { rx, _alive: alive }
    }

    /// Push a snapshot to every live subscriber of `key`.
    ///
    /// Dropped subscribers are pruned here, under every key.
    pub fn publish(&mut self, key: &K, snapshot: T) {
        self.prune();

        if let Some(subscribers) = self.subscribers.get_mut(key) {
            subscribers.retain(|sub| sub.tx.send(snapshot.clone()).is_ok());
            if subscribers.is_empty() {
                self.subscribers.remove(key);
            }
        }
    }

    /// Forget dropped subscriptions and keys nobody watches any more
    fn prune(&mut self) {
        self.subscribers.retain(|_, subscribers| {
            subscribers.retain(Subscriber::is_alive);
            !subscribers.is_empty()
        });
    }

    /// Live subscriber count for `key`
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.subscribers
            .get(key)
            .map(|subscribers| subscribers.iter().filter(|sub| sub.is_alive()).count())
            .unwrap_or(0)
    }

    /// Number of keys with at least one registered subscriber
    pub fn watched_keys(&self) -> usize {
        self.subscribers.len()
    }
}

/// Locally cached state fed by a subscription.
///
/// Each emission replaces the cache outright; there is no merging.
#[derive(Debug)]
pub struct LiveCache<T> {
    subscription: Subscription<T>,
    value: Option<T>,
}

impl<T> LiveCache<T> {
    pub fn new(subscription: Subscription<T>) -> Self {
        let mut cache = Self {
            subscription,
            value: None,
        };
        cache.sync();
        cache
    }

    /// Apply pending snapshots; returns true if the cache changed
    pub fn sync(&mut self) -> bool {
        match self.subscription.latest() {
            Some(snapshot) => {
                self.value = Some(snapshot);
                true
            }
            None => false,
        }
    }

    /// `None` until the first snapshot has arrived
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.value.is_none()
    }
}
