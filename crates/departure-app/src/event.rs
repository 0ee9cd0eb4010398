//! Application input events.
//!
//! [`AppEvent`]s drive the [`crate::App`] state machine. They come from two
//! places:
//! - The periodic tick and user input
//! - Feed notifications from the transport context, tagged with the
//!   generation of the connection they belong to

use departure_core::DecodeError;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// User asked for a reconnect.
    Reconnect,

    /// Transport attempt opened.
    Opened {
        /// Attempt id.
        generation: u64,
    },

    /// Transport attempt failed or timed out.
    OpenFailed {
        /// Attempt id.
        generation: u64,
        /// Failure description.
        reason: String,
    },

    /// Heartbeat received.
    Heartbeat {
        /// Connection it arrived on.
        generation: u64,
    },

    /// Trip cache was replaced by a schedule message.
    ScheduleUpdated {
        /// Connection it arrived on.
        generation: u64,
        /// Number of trips now cached.
        trips: usize,
    },

    /// Inbound message could not be decoded.
    DecodeFailed {
        /// Connection it arrived on.
        generation: u64,
        /// What went wrong.
        error: DecodeError,
    },

    /// Outbound message could not be delivered.
    SendFailed {
        /// Connection it was sent on.
        generation: u64,
        /// Failure description.
        reason: String,
    },

    /// Transport closed.
    Closed {
        /// Connection that closed.
        generation: u64,
    },
}
