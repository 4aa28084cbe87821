//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding relay envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unknown message group: {0}")]
    UnknownGroup(String),
}
