//! Persistent error status shown on the board.
//!
//! Set by connection failures and bad payloads. Connection errors clear when
//! a connection opens; payload and resource errors also clear on the next
//! schedule that decodes cleanly.

use std::fmt;

/// Where an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Repeated connection failures
    Connection,
    /// Feed sent a message that could not be decoded
    Payload,
    /// A local bound (payload size) was exceeded
    Resource,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::Payload => "payload",
            Self::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// The error currently flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    /// Origin of the error
    pub kind: StatusKind,
    /// Message for logs; the board shows a fixed placeholder
    pub message: String,
}

/// Current error status. Holds at most one error; the latest one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    error: Option<StatusError>,
}

impl Status {
    /// Flag an error.
    pub fn set_error(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.error = Some(StatusError { kind, message: message.into() });
    }

    /// Clear any error.
    pub fn clear(&mut self) {
        self.error = None;
    }

    /// Clear the error if it is of one of `kinds`.
    pub fn clear_kinds(&mut self, kinds: &[StatusKind]) {
        if self.error.as_ref().is_some_and(|e| kinds.contains(&e.kind)) {
            self.error = None;
        }
    }

    /// Whether an error is flagged.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The flagged error, if any.
    pub fn error(&self) -> Option<&StatusError> {
        self.error.as_ref()
    }
}
