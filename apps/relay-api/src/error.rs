use thiserror::Error;

/// An envelope could not be decoded from its wire form.
///
/// Decoding is all-or-nothing: a malformed record never yields a partially
/// populated envelope.
#[derive(Debug, Error)]
#[error("malformed envelope: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// An envelope could not be serialized.
#[derive(Debug, Error)]
#[error("failed to encode envelope: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Errors returned by [`Hub`](crate::gateway::coordinator::Hub) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// The coordinator loop is no longer running, so the event was not
    /// accepted.
    #[error("broadcast coordinator has stopped")]
    Stopped,
}
