//! Feed transport abstraction.
//!
//! A [`Transport`] opens text-message connections to the feed. Each open
//! connection is a pair of channels: the board sends on `outbound` and reads
//! from `inbound`. The transport closes `inbound` when the remote side goes
//! away; the board drops `outbound` to close its side.

use std::future::Future;

use departure_core::TransportError;
use tokio::{sync::mpsc, task::AbortHandle};

/// Opens feed connections.
///
/// Cloned into the task that performs each attempt, so implementations
/// should be cheap handles.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Open a connection to `url`.
    ///
    /// The runtime bounds the attempt with its own timeout.
    fn connect(&self, url: &str) -> impl Future<Output = Result<FeedConnection, TransportError>> + Send;
}

/// Board side of an open feed connection.
#[derive(Debug)]
pub struct FeedConnection {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<String>,
    abort: Option<AbortHandle>,
}

/// Transport side of an open feed connection.
#[derive(Debug)]
pub struct RemoteEnd {
    /// Deliver an inbound message to the board
    pub incoming: mpsc::Sender<String>,
    /// Messages the board sent
    pub outgoing: mpsc::Receiver<String>,
}

impl FeedConnection {
    /// Wrap existing channels.
    pub fn new(outbound: mpsc::Sender<String>, inbound: mpsc::Receiver<String>) -> Self {
        Self { outbound, inbound, abort: None }
    }

    /// Create a connected pair with `capacity` messages of buffering each way.
    pub fn pair(capacity: usize) -> (Self, RemoteEnd) {
        let (outbound, outgoing) = mpsc::channel(capacity);
        let (incoming, inbound) = mpsc::channel(capacity);
        (Self::new(outbound, inbound), RemoteEnd { incoming, outgoing })
    }

    /// Attach the task that drives the transport, aborted when the board
    /// closes the connection.
    #[must_use]
    pub fn with_abort(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    /// Split into outbound sender, inbound receiver, and abort handle.
    pub fn into_parts(self) -> (mpsc::Sender<String>, mpsc::Receiver<String>, Option<AbortHandle>) {
        (self.outbound, self.inbound, self.abort)
    }
}
