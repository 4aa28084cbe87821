//! Relay Protocol - Wire Types
//!
//! JSON message envelope exchanged between the relay and its clients.
//! This crate is the single source of truth for the envelope shape and
//! the fixed set of group tags.

pub mod error;
pub mod message;

pub use error::ProtocolError;
pub use message::{Group, Message, WELCOME_TEXT};
