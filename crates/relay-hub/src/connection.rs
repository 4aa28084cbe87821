//! Connection abstraction.
//!
//! A connection is split into an outbound half (`MessageSink`), which the
//! registry holds for broadcasting, and an inbound half (`MessageSource`),
//! which stays with the owning session.

use std::fmt;
use std::future::Future;

use bytes::Bytes;

use crate::error::ConnectionError;

/// Registry identity of a connection, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound half of a connection.
///
/// Implementations need no internal locking: every write goes through the
/// registry lock, so at most one `send` is in flight per sink.
pub trait MessageSink: Send + 'static {
    /// Write one text frame.
    fn send(
        &mut self,
        frame: String,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Close the channel and release its resources. Errors are swallowed.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Inbound half of a connection.
pub trait MessageSource: Send + 'static {
    /// Wait for the next data frame.
    ///
    /// Returns `ConnectionError::Closed` once the peer has gone away; any
    /// error ends the owning session.
    fn receive(&mut self) -> impl Future<Output = Result<Bytes, ConnectionError>> + Send;
}

/// An established channel, as yielded by a successful handshake.
pub struct Connection<S, R> {
    sink: S,
    source: R,
}

impl<S: MessageSink, R: MessageSource> Connection<S, R> {
    pub fn new(sink: S, source: R) -> Self {
        Self { sink, source }
    }

    pub fn into_parts(self) -> (S, R) {
        (self.sink, self.source)
    }
}
