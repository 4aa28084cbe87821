//! The relay message envelope.
//!
//! Every frame the relay writes is a JSON object of the form
//! `{"Group": "chat" | "count", "Content": "<string>"}`. Inbound frames carry
//! no required shape; they are re-wrapped as `chat` messages verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Text of the private message sent to a connection right after it registers.
pub const WELCOME_TEXT: &str = "Welcome to the chat!";

/// Category tag clients use to interpret a message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Relayed client text, or the welcome string.
    Chat,
    /// Decimal string of the current member count.
    Count,
}

impl Group {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "count" => Ok(Self::Count),
            other => Err(ProtocolError::UnknownGroup(other.to_string())),
        }
    }
}

/// Immutable message value, serialized once per broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "Group")]
    pub group: Group,
    #[serde(rename = "Content")]
    pub content: String,
}

impl Message {
    pub fn new(group: Group, content: impl Into<String>) -> Self {
        Self {
            group,
            content: content.into(),
        }
    }

    pub fn chat(content: impl Into<String>) -> Self {
        Self::new(Group::Chat, content)
    }

    /// Count announcement carrying `count` as a decimal string.
    pub fn count(count: usize) -> Self {
        Self::new(Group::Count, count.to_string())
    }

    pub fn welcome() -> Self {
        Self::chat(WELCOME_TEXT)
    }

    /// Wrap a raw inbound frame as a chat message.
    ///
    /// Frames are opaque bytes; invalid UTF-8 sequences are replaced rather
    /// than rejected.
    pub fn from_frame(frame: &[u8]) -> Self {
        Self::chat(String::from_utf8_lossy(frame).into_owned())
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
