//! Domain layer: messages, the subscription registry, and the connection
//! bridge.
//!
//! Nothing in here knows about HTTP or WebSocket framing. Transports plug
//! in through the [`Connection`] trait.

pub mod bridge;
pub mod connection;
pub mod message;
pub mod pubsub;

pub use bridge::{Bridge, BridgeState, CLOSE_GRACE};
pub use connection::{Connection, TransportError};
pub use message::Message;
pub use pubsub::{BroadcastError, PubSub, Subscriber, SubscriberHandle, SubscriberId};
