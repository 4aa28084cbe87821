//! Session — the per-connection control loop.
//!
//! `Handshaking -> Registered -> Relaying -> Closing -> Closed`
//!
//! Cleanup lives in `Session::close`, which consumes the session, so
//! deregistration and the channel close happen exactly once whichever way
//! the relay loop ended.

use std::sync::Arc;

use relay_protocol::Message;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcaster::Broadcaster;
use crate::connection::{Connection, ConnectionId, MessageSink, MessageSource};
use crate::error::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshaking,
    Registered,
    Relaying,
    Closing,
    Closed,
}

/// What a finished session reports back to whoever spawned it.
#[derive(Debug)]
pub struct SessionSummary {
    pub id: ConnectionId,
    /// Inbound frames relayed as chat broadcasts
    pub relayed: u64,
    pub state: SessionState,
    /// Error that ended the relay loop
    pub reason: ConnectionError,
    /// Members left after deregistration
    pub remaining: usize,
}

pub struct Session<S, R> {
    id: ConnectionId,
    hub: Arc<Broadcaster<S>>,
    source: R,
    state: SessionState,
    relayed: u64,
}

impl<S: MessageSink, R: MessageSource> Session<S, R> {
    /// Drive one connection from registration to cleanup.
    pub async fn run(hub: Arc<Broadcaster<S>>, connection: Connection<S, R>) -> SessionSummary {
        let mut session = Self::register(hub, connection).await;
        let reason = session.relay().await;
        session.close(reason).await
    }

    /// Run the session on its own task.
    pub fn spawn(hub: Arc<Broadcaster<S>>, connection: Connection<S, R>) -> JoinHandle<SessionSummary> {
        tokio::spawn(Self::run(hub, connection))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    async fn register(hub: Arc<Broadcaster<S>>, connection: Connection<S, R>) -> Self {
        let (sink, source) = connection.into_parts();
        let id = hub.registry().allocate_id();
        let mut session = Self {
            id,
            hub,
            source,
            state: SessionState::Handshaking,
            relayed: 0,
        };

        session.hub.registry().add(id, sink).await;
        session.state = SessionState::Registered;
        info!("Client registered: {id}");

        let welcome = Message::chat(session.hub.config().welcome_text.as_str());
        if let Err(e) = session.hub.send_to(id, &welcome).await {
            warn!("Failed to send welcome to {id}: {e}");
        }
        session.hub.announce_count().await;

        session
    }

    async fn relay(&mut self) -> ConnectionError {
        self.state = SessionState::Relaying;
        loop {
            match self.source.receive().await {
                Ok(frame) => {
                    let msg = Message::from_frame(&frame);
                    self.relayed += 1;
                    debug!("Relaying {} byte(s) from {}", frame.len(), self.id);
                    self.hub.broadcast(&msg).await;
                }
                Err(e) => return e,
            }
        }
    }

    async fn close(mut self, reason: ConnectionError) -> SessionSummary {
        self.state = SessionState::Closing;
        if reason.is_closed() {
            debug!("Client disconnected: {}", self.id);
        } else {
            warn!("Receive failed for {}: {reason}", self.id);
        }

        if let Some(mut sink) = self.hub.registry().remove(self.id).await {
            sink.close().await;
        }
        self.hub.announce_count().await;
        let remaining = self.hub.registry().count().await;

        self.state = SessionState::Closed;
        info!("Client deregistered: {} (total: {remaining})", self.id);

        SessionSummary {
            id: self.id,
            relayed: self.relayed,
            state: self.state,
            reason,
            remaining,
        }
    }
}
