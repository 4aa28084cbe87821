//! Relay Transport Layer
//!
//! HTTP front for the relay hub:
//! - `GET /` serves the chat page, pointed at the WebSocket endpoint
//! - `GET /ws` upgrades to WebSocket and hands the socket to a hub session
//!
//! The hub only sees the `ws` adapters, never axum types.

pub mod page;
pub mod server;
pub mod ws;

pub use server::{TransportConfig, TransportError, TransportServer, WsBroadcaster, endpoint_url, router};
pub use ws::{WsSink, WsSource, into_connection};
