//! Broadcast-only subscription registry.
//!
//! [`PubSub`] keeps every active [`Subscriber`] in an ordered map keyed by
//! a monotonically increasing [`SubscriberId`]. The map sits behind a single
//! [`parking_lot::Mutex`] that is held only while an entry is inserted,
//! removed, or the map is copied for a broadcast. Callbacks always run after
//! the lock has been released.
//!
//! # Broadcast semantics
//!
//! [`PubSub::broadcast`] snapshots the current subscribers, spawns one task
//! per subscriber and waits for all of them. A subscriber registered while
//! a broadcast is in flight may or may not see that message. A subscriber
//! that was in the snapshot still receives the message even if its handle
//! is released before its task runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures_util::future::join_all;
use parking_lot::Mutex;

use super::Message;

/// Opaque identity of one registration in a [`PubSub`].
///
/// Ids are never reused within a registry, so a stale handle can never
/// remove a newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Delivery callback invoked by [`PubSub::broadcast`].
///
/// Implementations must not block for an unbounded time and must not call
/// back into the registry that invoked them.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Delivers one broadcast message.
    async fn deliver(&self, message: Message);
}

#[async_trait]
impl<F> Subscriber for F
where
    F: Fn(Message) + Send + Sync + 'static,
{
    async fn deliver(&self, message: Message) {
        self(message);
    }
}

/// Errors returned by [`PubSub::broadcast`].
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// One or more subscriber callbacks panicked. Every other subscriber
    /// in the snapshot has already received the message.
    #[error("{} subscriber(s) failed, {delivered} delivered", failed.len())]
    SubscribersFailed {
        /// Registrations whose callback did not complete.
        failed: Vec<SubscriberId>,
        /// Number of callbacks that completed.
        delivered: usize,
    },
}

#[derive(Default)]
struct SubscriberSlots {
    next_id: u64,
    entries: BTreeMap<SubscriberId, Arc<dyn Subscriber>>,
}

impl SubscriberSlots {
    fn insert(&mut self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.insert(id, subscriber);
        id
    }
}

/// Process-local broadcast registry.
///
/// Cloning a `PubSub` yields another reference to the same registry.
#[derive(Clone, Default)]
pub struct PubSub {
    slots: Arc<Mutex<SubscriberSlots>>,
}

impl PubSub {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber` for all future broadcasts.
    ///
    /// The returned handle removes exactly this registration when released
    /// or dropped.
    pub fn subscribe<S: Subscriber>(&self, subscriber: S) -> SubscriberHandle {
        let id = self.slots.lock().insert(Arc::new(subscriber));
        tracing::debug!(subscriber_id = %id, "subscriber registered");
        SubscriberHandle {
            id,
            slots: Arc::downgrade(&self.slots),
            released: AtomicBool::new(false),
        }
    }

    /// Removes the registration behind `handle`.
    ///
    /// Releasing an already-released handle, or a handle issued by another
    /// registry, does nothing.
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        if !Weak::ptr_eq(&handle.slots, &Arc::downgrade(&self.slots)) {
            tracing::warn!(subscriber_id = %handle.id, "handle belongs to another registry");
            return;
        }
        handle.release();
    }

    /// Delivers `message` to every subscriber registered right now and
    /// waits until every callback has returned.
    ///
    /// Returns the number of subscribers the message was delivered to.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::SubscribersFailed`] if any callback
    /// panicked. The failure is isolated: all other callbacks still run to
    /// completion before this returns.
    pub async fn broadcast(&self, message: Message) -> Result<usize, BroadcastError> {
        let snapshot: Vec<(SubscriberId, Arc<dyn Subscriber>)> = {
            let slots = self.slots.lock();
            slots
                .entries
                .iter()
                .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
                .collect()
        };

        if snapshot.is_empty() {
            tracing::debug!("broadcast with no subscribers");
            return Ok(0);
        }

        tracing::debug!(subscribers = snapshot.len(), bytes = message.len(), "broadcasting");

        let mut ids = Vec::with_capacity(snapshot.len());
        let mut tasks = Vec::with_capacity(snapshot.len());
        for (id, subscriber) in snapshot {
            let message = message.clone();
            ids.push(id);
            tasks.push(tokio::spawn(async move { subscriber.deliver(message).await }));
        }

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, outcome) in ids.into_iter().zip(join_all(tasks).await) {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(subscriber_id = %id, error = %e, "subscriber callback failed");
                    failed.push(id);
                }
            }
        }

        if failed.is_empty() {
            Ok(delivered)
        } else {
            Err(BroadcastError::SubscribersFailed { failed, delivered })
        }
    }

    /// Returns the number of live registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slots.lock().entries.len()
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Capability to stop one subscriber from receiving further broadcasts.
///
/// Release is idempotent and also happens on drop. The handle keeps only a
/// weak reference to its registry, so releasing after the registry is gone
/// is a no-op.
pub struct SubscriberHandle {
    id: SubscriberId,
    slots: Weak<Mutex<SubscriberSlots>>,
    released: AtomicBool,
}

impl SubscriberHandle {
    /// Identity of the registration this handle controls.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Removes the registration. Only the first call has any effect.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(slots) = self.slots.upgrade() else {
            return;
        };
        if slots.lock().entries.remove(&self.id).is_some() {
            tracing::debug!(subscriber_id = %self.id, "subscriber released");
        }
    }

    /// Returns `true` once [`release`](Self::release) has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
