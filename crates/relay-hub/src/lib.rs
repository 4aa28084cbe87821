//! Relay Hub
//!
//! The connection registry and broadcast engine behind the relay:
//! - `Registry`: the set of broadcast-eligible connections
//! - `Broadcaster`: fail-fast fan-out of one message to every member
//! - `Session`: per-connection loop (register, relay, single cleanup)
//!
//! The hub never touches sockets directly. Transports hand it a
//! `Connection` made of a `MessageSink` and a `MessageSource`.

pub mod broadcaster;
pub mod connection;
pub mod error;
pub mod registry;
pub mod session;

pub use broadcaster::{BroadcastOutcome, Broadcaster, HubConfig};
pub use connection::{Connection, ConnectionId, MessageSink, MessageSource};
pub use error::{ConnectionError, HubError};
pub use registry::Registry;
pub use session::{Session, SessionState, SessionSummary};
