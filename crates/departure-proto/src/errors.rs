//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding inbound or encoding outbound messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Raw payload is larger than the configured bound
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Size of the rejected payload in bytes
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Payload is not valid JSON or does not match the message shape
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Envelope has no `event` discriminant
    #[error("missing event field")]
    MissingEvent,

    /// Envelope carries an event this client does not understand
    #[error("unrecognized event: {0:?}")]
    UnknownEvent(String),

    /// Outbound message could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Returns true if the payload was rejected for its size rather than its
    /// content.
    pub fn is_oversized(&self) -> bool {
        matches!(self, Self::PayloadTooLarge { .. })
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
