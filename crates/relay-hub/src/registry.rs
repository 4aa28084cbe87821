//! Registry — the set of broadcast-eligible connections.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::connection::{ConnectionId, MessageSink};

/// Member map, keyed by id. Iteration order is registration order.
pub(crate) type Members<S> = BTreeMap<ConnectionId, S>;

/// Holds the outbound half of every registered connection.
///
/// A single async mutex guards the member map. The broadcaster keeps it
/// locked for a whole fan-out, so sends, adds and removes are serialized
/// against each other. A slow member therefore stalls everyone until its
/// send completes or fails.
pub struct Registry<S> {
    members: Mutex<Members<S>>,
    next_id: AtomicU64,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self {
            members: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<S: MessageSink> Registry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next connection id. Ids are never reused.
    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert a member. Returns `false` (and drops `sink`) if `id` is
    /// already registered.
    pub async fn add(&self, id: ConnectionId, sink: S) -> bool {
        let mut members = self.members.lock().await;
        if members.contains_key(&id) {
            debug!("Registry add ignored, {id} already present");
            return false;
        }
        members.insert(id, sink);
        true
    }

    /// Remove a member, handing its sink back to the caller.
    /// Removing an absent id is a no-op.
    pub async fn remove(&self, id: ConnectionId) -> Option<S> {
        self.members.lock().await.remove(&id)
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().await.contains_key(&id)
    }

    pub async fn count(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Current member ids, in the order a broadcast would visit them.
    pub async fn snapshot(&self) -> Vec<ConnectionId> {
        self.members.lock().await.keys().copied().collect()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Members<S>> {
        self.members.lock().await
    }
}
