//! Per-connection bridge between a [`Connection`] and the [`PubSub`]
//! registry.
//!
//! A [`Bridge`] owns one registry subscription and runs two loops:
//!
//! - **inbound drain**: reads and discards everything the peer sends. Its
//!   only job is to notice when the peer goes away.
//! - **outbound delivery**: takes messages out of a single-slot inbox and
//!   writes them to the connection.
//!
//! The registry callback pushes into the inbox while racing the bridge's
//! closing signal. If the previous message has not been written yet, the
//! broadcasting task waits, so a subscriber never has more than one
//! message queued.
//!
//! # Lifecycle
//!
//! ```text
//! Active ──(peer EOF | read error | write error | close())──► Closing
//! Closing ──(both loops exited)──► Closed
//! ```
//!
//! Entering `Closing` cancels the shared token and releases the registry
//! handle. The delivery loop closes the underlying connection on its way
//! out (or [`Bridge::close`] does, if the loops never ran), so
//! [`Bridge::wait`] only returns after the connection is closed. A
//! transport close that does not finish within [`CLOSE_GRACE`] is
//! abandoned and the connection is dropped instead.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{Connection, Message, PubSub, Subscriber, SubscriberHandle};

/// How long a graceful transport close may take before it is abandoned.
///
/// A peer that stopped reading can keep a close handshake pending forever.
pub const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Observable lifecycle state of a [`Bridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Both loops are (or may be) running and broadcasts are accepted.
    Active,
    /// Closing has been triggered; loops are winding down.
    Closing,
    /// Both loops have exited and the subscription is released.
    Closed,
}

/// What moved the bridge out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PeerClosed,
    ReadFailed,
    WriteFailed,
    InboxClosed,
    Requested,
}

/// State shared by the bridge, its two loops, and nothing else.
struct Lifecycle {
    id: uuid::Uuid,
    closing: AtomicBool,
    token: CancellationToken,
    subscription: SubscriberHandle,
    tracker: TaskTracker,
}

impl Lifecycle {
    /// First caller wins; every later call is a no-op.
    fn close(&self, reason: CloseReason) {
        if self.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(connection_id = %self.id, ?reason, "bridge closing");
        self.token.cancel();
        self.subscription.release();
        self.tracker.close();
    }
}

/// Registry callback that hands messages to the delivery loop.
struct Inbox {
    tx: mpsc::Sender<Message>,
    token: CancellationToken,
}

#[async_trait]
impl Subscriber for Inbox {
    async fn deliver(&self, message: Message) {
        tokio::select! {
            biased;
            () = self.token.cancelled() => {}
            sent = self.tx.send(message) => {
                if sent.is_err() {
                    tracing::trace!("delivery loop already gone");
                }
            }
        }
    }
}

/// Adapts one duplex [`Connection`] into a single [`PubSub`] subscription.
pub struct Bridge<C: Connection> {
    connection: Arc<C>,
    lifecycle: Arc<Lifecycle>,
    inbox: Mutex<Option<mpsc::Receiver<Message>>>,
}

impl<C: Connection> Bridge<C> {
    /// Registers a new bridge for `connection` with `pubsub`.
    ///
    /// Broadcasts are accepted into the inbox immediately, but nothing is
    /// written to the connection until [`start`](Self::start) is called.
    pub fn new(connection: C, pubsub: &PubSub) -> Self {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        let subscription = pubsub.subscribe(Inbox {
            tx,
            token: token.clone(),
        });
        let id = uuid::Uuid::new_v4();
        tracing::debug!(connection_id = %id, subscriber_id = %subscription.id(), "bridge created");

        Self {
            connection: Arc::new(connection),
            lifecycle: Arc::new(Lifecycle {
                id,
                closing: AtomicBool::new(false),
                token,
                subscription,
                tracker: TaskTracker::new(),
            }),
            inbox: Mutex::new(Some(rx)),
        }
    }

    /// Unique id of this connection, used in logs.
    #[must_use]
    pub fn id(&self) -> uuid::Uuid {
        self.lifecycle.id
    }

    /// Spawns the inbound-drain and outbound-delivery loops.
    ///
    /// Calling `start` more than once, or after [`close`](Self::close), has
    /// no further effect.
    pub fn start(&self) {
        let Some(inbox) = self.inbox.lock().take() else {
            tracing::warn!(connection_id = %self.lifecycle.id, "bridge already started or closed");
            return;
        };

        let tracker = &self.lifecycle.tracker;
        tracker.spawn(drain_inbound(
            Arc::clone(&self.connection),
            Arc::clone(&self.lifecycle),
        ));
        tracker.spawn(deliver_outbound(
            Arc::clone(&self.connection),
            Arc::clone(&self.lifecycle),
            inbox,
        ));
    }

    /// Waits until both loops have exited.
    ///
    /// A bridge that was never started completes as soon as it is closed.
    pub async fn wait(&self) {
        self.lifecycle.tracker.wait().await;
    }

    /// Starts the bridge and waits for it to finish.
    pub async fn run(self) {
        self.start();
        self.wait().await;
        tracing::debug!(connection_id = %self.lifecycle.id, "bridge closed");
    }

    /// Triggers `Closing`. Idempotent.
    ///
    /// On a bridge that was never started, the connection is closed here
    /// since no delivery loop exists to do it. Must be called from within a
    /// Tokio runtime in that case.
    pub fn close(&self) {
        if let Some(inbox) = self.inbox.lock().take() {
            drop(inbox);
            self.lifecycle.tracker.spawn(shutdown_connection(
                Arc::clone(&self.connection),
                Arc::clone(&self.lifecycle),
            ));
        }
        self.lifecycle.close(CloseReason::Requested);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        if !self.lifecycle.closing.load(Ordering::Acquire) {
            BridgeState::Active
        } else if self.lifecycle.tracker.is_empty() {
            BridgeState::Closed
        } else {
            BridgeState::Closing
        }
    }
}

impl<C: Connection> fmt::Debug for Bridge<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.lifecycle.id)
            .field("subscriber_id", &self.lifecycle.subscription.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn drain_inbound<C: Connection>(connection: Arc<C>, lifecycle: Arc<Lifecycle>) {
    let mut discarded = 0usize;
    let reason = loop {
        tokio::select! {
            biased;
            () = lifecycle.token.cancelled() => break None,
            frame = connection.recv() => match frame {
                Ok(Some(len)) => discarded = discarded.saturating_add(len),
                Ok(None) => break Some(CloseReason::PeerClosed),
                Err(e) => {
                    tracing::debug!(connection_id = %lifecycle.id, error = %e, "inbound read failed");
                    break Some(CloseReason::ReadFailed);
                }
            },
        }
    };

    tracing::trace!(connection_id = %lifecycle.id, discarded, "inbound drain finished");
    if let Some(reason) = reason {
        lifecycle.close(reason);
    }
}

async fn deliver_outbound<C: Connection>(
    connection: Arc<C>,
    lifecycle: Arc<Lifecycle>,
    mut inbox: mpsc::Receiver<Message>,
) {
    let reason = loop {
        let message = tokio::select! {
            biased;
            () = lifecycle.token.cancelled() => break None,
            next = inbox.recv() => match next {
                Some(message) => message,
                None => break Some(CloseReason::InboxClosed),
            },
        };

        let written = tokio::select! {
            biased;
            () = lifecycle.token.cancelled() => break None,
            written = connection.send(&message) => written,
        };
        if let Err(e) = written {
            tracing::debug!(connection_id = %lifecycle.id, error = %e, "outbound write failed");
            break Some(CloseReason::WriteFailed);
        }
    };

    if let Some(reason) = reason {
        lifecycle.close(reason);
    }
    shutdown_connection(connection, lifecycle).await;
}

async fn shutdown_connection<C: Connection>(connection: Arc<C>, lifecycle: Arc<Lifecycle>) {
    match tokio::time::timeout(CLOSE_GRACE, connection.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::trace!(connection_id = %lifecycle.id, error = %e, "connection close failed");
        }
        Err(_) => {
            tracing::debug!(connection_id = %lifecycle.id, "connection close timed out, dropping");
        }
    }
}
