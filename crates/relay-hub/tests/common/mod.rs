//! In-memory connections for hub tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use relay_hub::{Connection, ConnectionError, MessageSink, MessageSource};
use relay_protocol::Message;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Shared log of send attempts across every mock sink, as `(label, frame)`.
pub type AttemptLog = Arc<Mutex<Vec<(String, String)>>>;

pub struct MockSink {
    label: String,
    delivered: mpsc::UnboundedSender<String>,
    attempts: AttemptLog,
    failing: Arc<AtomicBool>,
    hang: bool,
    closes: Arc<AtomicUsize>,
}

impl MessageSink for MockSink {
    async fn send(&mut self, frame: String) -> Result<(), ConnectionError> {
        self.attempts.lock().push((self.label.clone(), frame.clone()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConnectionError::Transport(format!("{} is broken", self.label)));
        }
        self.delivered
            .send(frame)
            .map_err(|_| ConnectionError::Closed)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockSource {
    inbound: mpsc::UnboundedReceiver<Result<Bytes, ConnectionError>>,
}

impl MessageSource for MockSource {
    async fn receive(&mut self) -> Result<Bytes, ConnectionError> {
        match self.inbound.recv().await {
            Some(result) => result,
            None => Err(ConnectionError::Closed),
        }
    }
}

/// Test-side handle on a mock connection.
pub struct Peer {
    pub label: String,
    received: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<Result<Bytes, ConnectionError>>>,
    failing: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl Peer {
    /// Next frame written to this peer, parsed as an envelope.
    pub async fn next(&mut self) -> Message {
        let frame = timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("Timeout waiting for frame")
            .expect("Sink dropped");
        Message::from_json(&frame).expect("Invalid envelope")
    }

    /// Assert nothing else has been written to this peer.
    pub async fn assert_idle(&mut self) {
        let res = timeout(Duration::from_millis(100), self.received.recv()).await;
        if let Ok(Some(frame)) = res {
            panic!("{} got unexpected frame: {frame}", self.label);
        }
    }

    pub fn say(&self, text: &str) {
        if let Some(tx) = &self.inbound {
            tx.send(Ok(Bytes::copy_from_slice(text.as_bytes()))).unwrap();
        }
    }

    pub fn fail_receive(&self, reason: &str) {
        if let Some(tx) = &self.inbound {
            tx.send(Err(ConnectionError::Transport(reason.into()))).unwrap();
        }
    }

    /// Drop the inbound channel, which the source reports as a close.
    pub fn hang_up(&mut self) {
        self.inbound.take();
    }

    pub fn break_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub fn attempt_log() -> AttemptLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn mock_connection(label: &str, attempts: &AttemptLog) -> (Connection<MockSink, MockSource>, Peer) {
    build(label, attempts, false)
}

/// A connection whose sends never complete.
pub fn stalled_connection(label: &str, attempts: &AttemptLog) -> (Connection<MockSink, MockSource>, Peer) {
    build(label, attempts, true)
}

fn build(label: &str, attempts: &AttemptLog, hang: bool) -> (Connection<MockSink, MockSource>, Peer) {
    let (delivered_tx, delivered_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let failing = Arc::new(AtomicBool::new(false));
    let closes = Arc::new(AtomicUsize::new(0));

    let sink = MockSink {
        label: label.to_string(),
        delivered: delivered_tx,
        attempts: attempts.clone(),
        failing: failing.clone(),
        hang,
        closes: closes.clone(),
    };
    let source = MockSource { inbound: inbound_rx };

    let peer = Peer {
        label: label.to_string(),
        received: delivered_rx,
        inbound: Some(inbound_tx),
        failing,
        closes,
    };
    (Connection::new(sink, source), peer)
}
