//! Error types for the departure board core.
//!
//! Decode errors come from feed payloads and end up on the board as a status
//! message. Rule errors come from configuration text. Transport errors are
//! produced by drivers and only ever reach the connection manager as a
//! failure reason.

use std::time::Duration;

use departure_proto::ProtocolError;
use thiserror::Error;

/// Errors from turning a raw feed message into cache contents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload was larger than the configured bound
    #[error("payload too large: {size} bytes (max {max})")]
    Oversized {
        /// Size of the rejected payload
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Payload could not be parsed
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Feed sent an event this client does not handle
    #[error("unrecognized event: {0:?}")]
    UnknownEvent(String),
}

impl DecodeError {
    /// Returns true if the payload was rejected for its size.
    ///
    /// These surface as a resource error rather than a payload error, since
    /// the content may be valid and only the local bound was exceeded.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::Oversized { .. })
    }
}

impl From<ProtocolError> for DecodeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::PayloadTooLarge { size, max } => Self::Oversized { size, max },
            ProtocolError::UnknownEvent(event) => Self::UnknownEvent(event),
            ProtocolError::MissingEvent => Self::Malformed("missing event field".into()),
            ProtocolError::Malformed(msg) | ProtocolError::Encode(msg) => Self::Malformed(msg),
        }
    }
}

/// Errors from parsing configuration rule text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Color is not 1 to 6 hex digits
    #[error("invalid color {0:?}: expected up to 6 hex digits")]
    InvalidColor(String),

    /// Rule line does not have the expected shape
    #[error("malformed rule line {line:?}: expected {expected}")]
    MalformedLine {
        /// Offending line
        line: String,
        /// Human-readable shape description
        expected: &'static str,
    },
}

/// Errors reported by a transport while connecting or sending.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not establish the connection
    #[error("connect failed: {0}")]
    Connect(String),

    /// Operation did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Outbound message could not be delivered
    #[error("send failed: {0}")]
    Send(String),

    /// Connection is already closed
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// Returns true if this error may succeed on retry.
    ///
    /// Every transport failure is retried by the connection manager; this is
    /// only used to pick a log level.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_maps_to_resource_exhaustion() {
        let err = DecodeError::from(ProtocolError::PayloadTooLarge { size: 10, max: 5 });
        assert_eq!(err, DecodeError::Oversized { size: 10, max: 5 });
        assert!(err.is_resource_exhaustion());
    }

    #[test]
    fn content_errors_are_not_resource_exhaustion() {
        let cases = [
            ProtocolError::Malformed("x".into()),
            ProtocolError::MissingEvent,
            ProtocolError::UnknownEvent("alerts".into()),
        ];
        for case in cases {
            assert!(!DecodeError::from(case).is_resource_exhaustion());
        }
    }

    #[test]
    fn error_display_messages() {
        let err = DecodeError::Oversized { size: 60000, max: 49152 };
        assert_eq!(err.to_string(), "payload too large: 60000 bytes (max 49152)");

        let err = RuleError::InvalidColor("XYZ".into());
        assert_eq!(err.to_string(), "invalid color \"XYZ\": expected up to 6 hex digits");

        let err = TransportError::Timeout(Duration::from_secs(20));
        assert_eq!(err.to_string(), "timed out after 20s");
    }
}
