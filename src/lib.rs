//! # pubsub-gateway
//!
//! Broadcast-only publish/subscribe over HTTP and WebSocket.
//!
//! Publishers `POST /broadcast` a JSON message; every client currently
//! connected to the `/subscribe` WebSocket receives it. There is one
//! global channel, no topics, and no persistence: a subscriber that is not
//! connected when a message is broadcast never sees it.
//!
//! ## Architecture
//!
//! ```text
//! Publishers (HTTP)        Subscribers (WebSocket)
//!     │                          │
//!     ├── REST Handlers (api/)   ├── WS Handler (ws/)
//!     │                          │
//!     │                    Bridge (domain/)
//!     │                          │
//!     └──────── PubSub (domain/) ┘
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod ws;
