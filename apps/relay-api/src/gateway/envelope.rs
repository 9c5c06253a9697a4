//! Wire-format envelope relayed between hub connections.

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

/// Content of the notice sent to existing members when a connection joins.
pub const JOINED_NOTICE: &str = "a new connection has joined";

/// Content of the notice sent to remaining members when a connection leaves.
pub const DISCONNECTED_NOTICE: &str = "a connection has disconnected";

/// A message as it travels over the wire.
///
/// Empty fields are left out of the encoded record entirely and read back as
/// empty strings. `recipient` is carried but never used for routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recipient: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Envelope {
    /// Build a hub-originated envelope (no sender, no recipient).
    pub fn system(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Self::default()
        }
    }

    /// Wrap a client frame as opaque content from `sender`.
    pub fn relayed(sender: &str, content: impl Into<String>) -> Self {
        Self {
            sender: sender.to_string(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Serialize to the JSON wire form.
    pub fn encode(&self) -> Result<Utf8Bytes, EncodeError> {
        Ok(serde_json::to_string(self)?.into())
    }

    /// Parse the JSON wire form. Invalid JSON, non-string fields, or trailing
    /// data are rejected as a whole.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
