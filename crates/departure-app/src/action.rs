//! Application side-effects.
//!
//! [`AppAction`]s are produced by the [`crate::App`] state machine for the
//! runtime to execute. Status changes are applied inside the App and never
//! reach the runtime.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the board.
    Render,

    /// Open a feed connection.
    Open {
        /// Attempt id to report back with.
        generation: u64,
        /// Feed endpoint.
        url: String,
    },

    /// Send text on a feed connection.
    Send {
        /// Connection to send on.
        generation: u64,
        /// Serialized message.
        text: String,
    },

    /// Close a feed connection.
    Close {
        /// Connection to close.
        generation: u64,
    },

    /// Request a full process restart.
    Restart,
}
