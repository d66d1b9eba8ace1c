//! WebSocket layer: upgrade handling, the socket-backed connection, and
//! the wire format.
//!
//! The WebSocket endpoint at `/subscribe` is receive-only from the
//! client's point of view; anything the client sends is discarded.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::WsConnection;
pub use messages::WireMessage;
