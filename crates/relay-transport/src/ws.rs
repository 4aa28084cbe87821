//! Adapters from an axum WebSocket to the hub's sink/source halves.

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_hub::{Connection, ConnectionError, MessageSink, MessageSource};

/// Write half of an upgraded socket.
pub struct WsSink(SplitSink<WebSocket, Message>);

/// Read half of an upgraded socket.
pub struct WsSource(SplitStream<WebSocket>);

/// Split an upgraded socket into a hub connection.
pub fn into_connection(socket: WebSocket) -> Connection<WsSink, WsSource> {
    let (tx, rx) = socket.split();
    Connection::new(WsSink(tx), WsSource(rx))
}

impl MessageSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), ConnectionError> {
        self.0
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.close().await;
    }
}

impl MessageSource for WsSource {
    async fn receive(&mut self) -> Result<Bytes, ConnectionError> {
        loop {
            match self.0.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Bytes::copy_from_slice(text.as_str().as_bytes()));
                }
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Close(_))) | None => return Err(ConnectionError::Closed),
                // Ping/pong are answered by the socket itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ConnectionError::Transport(e.to_string())),
            }
        }
    }
}
