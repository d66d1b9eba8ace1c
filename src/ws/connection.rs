//! [`Connection`] implementation over an Axum WebSocket.
//!
//! The socket is split once; each half gets its own lock so the bridge's
//! drain loop can sit in `recv` while the delivery loop writes.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::ws::{Message as Frame, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use super::messages::WireMessage;
use crate::domain::{Connection, Message, TransportError};

/// One upgraded subscriber socket.
#[derive(Debug)]
pub struct WsConnection {
    sink: Mutex<SplitSink<WebSocket, Frame>>,
    stream: Mutex<SplitStream<WebSocket>>,
    remote_addr: SocketAddr,
}

impl WsConnection {
    /// Wraps an upgraded socket.
    #[must_use]
    pub fn new(socket: WebSocket, remote_addr: SocketAddr) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            remote_addr,
        }
    }

    /// Address of the connected peer.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv(&self) -> Result<Option<usize>, TransportError> {
        match self.stream.lock().await.next().await {
            Some(Ok(Frame::Close(_))) | None => Ok(None),
            Some(Ok(Frame::Text(text))) => Ok(Some(text.as_str().len())),
            Some(Ok(Frame::Binary(bytes) | Frame::Ping(bytes) | Frame::Pong(bytes))) => {
                Ok(Some(bytes.len()))
            }
            Some(Err(e)) => Err(TransportError::Read(e.to_string())),
        }
    }

    async fn send(&self, message: &Message) -> Result<(), TransportError> {
        let json = WireMessage::from(message).encode()?;
        self.sink
            .lock()
            .await
            .send(Frame::text(json))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|_| TransportError::Closed)
    }
}
