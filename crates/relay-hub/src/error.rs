//! Hub error types.

use std::time::Duration;

use relay_protocol::ProtocolError;
use thiserror::Error;

use crate::connection::ConnectionId;

/// Failure of a single channel operation.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Peer closed the channel (close frame or end of stream).
    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),

    /// Write deadline expired before the frame was flushed.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl ConnectionError {
    /// Whether this is an orderly close rather than a fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("{0} is not registered")]
    NotRegistered(ConnectionId),

    #[error("send to {id} failed: {source}")]
    Send {
        id: ConnectionId,
        #[source]
        source: ConnectionError,
    },
}
