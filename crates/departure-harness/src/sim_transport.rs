//! Simulated feed transport.
//!
//! Each connect attempt consumes the next [`ConnectScript`] entry. Accepted
//! connections are handed to the test through [`SimFeed`], which plays the
//! feed server: it reads what the board sent and pushes messages back.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use departure_app::{FeedConnection, RemoteEnd, Transport};
use departure_core::TransportError;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffering in each direction of a simulated connection.
const CONNECTION_CAPACITY: usize = 16;

/// Outcome of one scripted connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectScript {
    /// Open the connection and hand the remote end to [`SimFeed`]
    Accept,
    /// Fail immediately
    Refuse(String),
    /// Never complete; the runtime's connect timeout fires
    Hang,
}

#[derive(Debug)]
struct TransportState {
    script: VecDeque<ConnectScript>,
    fallback: ConnectScript,
    attempts: Vec<String>,
}

/// Scripted [`Transport`].
///
/// Attempts beyond the script use the fallback outcome, which defaults to
/// refusing.
#[derive(Debug, Clone)]
pub struct SimTransport {
    state: Arc<Mutex<TransportState>>,
    accepted: mpsc::UnboundedSender<RemoteEnd>,
}

/// Server side of every connection a [`SimTransport`] accepted.
#[derive(Debug)]
pub struct SimFeed {
    accepted: mpsc::UnboundedReceiver<RemoteEnd>,
    state: Arc<Mutex<TransportState>>,
}

impl SimTransport {
    /// Create a transport following `script` and the feed it accepts into.
    pub fn new(script: impl IntoIterator<Item = ConnectScript>) -> (Self, SimFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(TransportState {
            script: script.into_iter().collect(),
            fallback: ConnectScript::Refuse("connection refused".into()),
            attempts: Vec::new(),
        }));
        (Self { state: state.clone(), accepted: tx }, SimFeed { accepted: rx, state })
    }

    /// Transport that accepts every attempt.
    pub fn accepting() -> (Self, SimFeed) {
        let (transport, feed) = Self::new([]);
        transport.lock().fallback = ConnectScript::Accept;
        (transport, feed)
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for SimTransport {
    async fn connect(&self, url: &str) -> Result<FeedConnection, TransportError> {
        let script = {
            let mut state = self.lock();
            state.attempts.push(url.to_owned());
            state.script.pop_front().unwrap_or_else(|| state.fallback.clone())
        };
        debug!(url, ?script, "simulated connect");

        match script {
            ConnectScript::Accept => {
                let (connection, remote) = FeedConnection::pair(CONNECTION_CAPACITY);
                self.accepted.send(remote).map_err(|_| TransportError::Closed)?;
                Ok(connection)
            },
            ConnectScript::Refuse(reason) => Err(TransportError::Connect(reason)),
            ConnectScript::Hang => std::future::pending().await,
        }
    }
}

impl SimFeed {
    /// Wait for the next accepted connection.
    pub async fn accept(&mut self) -> Option<RemoteEnd> {
        self.accepted.recv().await
    }

    /// Next accepted connection, if one is already waiting.
    pub fn try_accept(&mut self) -> Option<RemoteEnd> {
        self.accepted.try_recv().ok()
    }

    /// URLs of every connect attempt so far.
    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).attempts.clone()
    }

    /// Append outcomes to the script.
    pub fn script(&self, outcomes: impl IntoIterator<Item = ConnectScript>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).script.extend(outcomes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_script_then_fallback() {
        let (transport, mut feed) =
            SimTransport::new([ConnectScript::Refuse("nope".into()), ConnectScript::Accept]);

        assert!(matches!(
            transport.connect("ws://feed").await,
            Err(TransportError::Connect(reason)) if reason == "nope"
        ));
        assert!(transport.connect("ws://feed").await.is_ok());
        assert!(feed.try_accept().is_some());
        assert!(transport.connect("ws://feed").await.is_err());
        assert_eq!(feed.attempts().len(), 3);
    }

    #[tokio::test]
    async fn accepted_connection_is_wired_both_ways() {
        let (transport, mut feed) = SimTransport::accepting();
        let connection = transport.connect("ws://feed").await.unwrap();
        let mut remote = feed.accept().await.unwrap();
        let (outbound, mut inbound, _) = connection.into_parts();

        outbound.send("subscribe".into()).await.unwrap();
        assert_eq!(remote.outgoing.recv().await.as_deref(), Some("subscribe"));

        remote.incoming.send("heartbeat".into()).await.unwrap();
        assert_eq!(inbound.recv().await.as_deref(), Some("heartbeat"));
    }
}
