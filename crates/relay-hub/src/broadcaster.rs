//! Broadcaster — fan-out of one message to every registered member.
//!
//! Delivery policy is fail-fast: the first failed send aborts the rest of
//! that pass. The failed member stays registered; it leaves the registry
//! only when its own session ends.

use std::time::Duration;

use relay_protocol::{Message, WELCOME_TEXT};
use tracing::{debug, error, warn};

use crate::connection::{ConnectionId, MessageSink};
use crate::error::{ConnectionError, HubError};
use crate::registry::{Members, Registry};

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Private message sent to each connection right after registration
    pub welcome_text: String,
    /// Write deadline per send (None waits indefinitely)
    pub send_timeout: Option<Duration>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            welcome_text: WELCOME_TEXT.into(),
            send_timeout: None,
        }
    }
}

/// Result of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Members the frame was written to
    pub delivered: usize,
    /// Member whose send failed and ended the pass
    pub failed: Option<ConnectionId>,
    /// Members after the failed one that were never attempted
    pub skipped: usize,
}

impl BroadcastOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Owns the registry and serializes every write to its members.
///
/// One instance is created at startup and shared (via `Arc`) by all
/// sessions for the life of the process.
pub struct Broadcaster<S> {
    registry: Registry<S>,
    config: HubConfig,
}

impl<S: MessageSink> Broadcaster<S> {
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Deliver `msg` to every member registered when the lock is acquired.
    ///
    /// Never fails: send errors are logged and reported in the outcome.
    pub async fn broadcast(&self, msg: &Message) -> BroadcastOutcome {
        let frame = match msg.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Dropping {} broadcast: {e}", msg.group);
                return BroadcastOutcome::default();
            }
        };

        let mut members = self.registry.lock().await;
        self.fan_out(&mut members, &frame).await
    }

    /// Broadcast the current member count.
    ///
    /// The count is read under the same lock as the fan-out, so the
    /// announced value is the membership every recipient belongs to.
    pub async fn announce_count(&self) -> BroadcastOutcome {
        let mut members = self.registry.lock().await;
        let msg = Message::count(members.len());
        match msg.to_json() {
            Ok(frame) => self.fan_out(&mut members, &frame).await,
            Err(e) => {
                error!("Dropping count broadcast: {e}");
                BroadcastOutcome::default()
            }
        }
    }

    /// Send `msg` to a single member only.
    pub async fn send_to(&self, id: ConnectionId, msg: &Message) -> Result<(), HubError> {
        let frame = msg.to_json()?;
        let mut members = self.registry.lock().await;
        let sink = members.get_mut(&id).ok_or(HubError::NotRegistered(id))?;
        self.deliver(sink, frame)
            .await
            .map_err(|source| HubError::Send { id, source })
    }

    async fn fan_out(&self, members: &mut Members<S>, frame: &str) -> BroadcastOutcome {
        let total = members.len();
        let mut delivered = 0;

        for (id, sink) in members.iter_mut() {
            if let Err(e) = self.deliver(sink, frame.to_owned()).await {
                let skipped = total - delivered - 1;
                warn!("Broadcast to {id} failed, aborting pass ({skipped} skipped): {e}");
                return BroadcastOutcome {
                    delivered,
                    failed: Some(*id),
                    skipped,
                };
            }
            delivered += 1;
        }

        debug!("Broadcast delivered to {delivered} member(s)");
        BroadcastOutcome {
            delivered,
            failed: None,
            skipped: 0,
        }
    }

    async fn deliver(&self, sink: &mut S, frame: String) -> Result<(), ConnectionError> {
        match self.config.send_timeout {
            Some(limit) => tokio::time::timeout(limit, sink.send(frame))
                .await
                .map_err(|_| ConnectionError::Timeout(limit))?,
            None => sink.send(frame).await,
        }
    }
}
