//! WebSocket feed transport.
//!
//! Each connection runs one task that pumps text frames between the socket
//! and the [`FeedConnection`] channels. The task ends, closing the board's
//! inbound channel, when either side goes away.

use departure_app::{FeedConnection, Transport};
use departure_core::TransportError;

/// Transport used when the binary is built without WebSocket support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedTransport;

impl Transport for UnsupportedTransport {
    async fn connect(&self, url: &str) -> Result<FeedConnection, TransportError> {
        Err(TransportError::Connect(format!("no transport for {url}: built without websocket support")))
    }
}

#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

#[cfg(feature = "websocket")]
mod websocket {
    use departure_app::RemoteEnd;
    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::{connect_async, tungstenite::Message};
    use tracing::{debug, trace, warn};

    use super::{FeedConnection, Transport, TransportError};

    /// Buffering in each direction.
    const CHANNEL_CAPACITY: usize = 32;

    /// Opens `ws://` and `wss://` feed connections.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WebSocketTransport;

    impl Transport for WebSocketTransport {
        async fn connect(&self, url: &str) -> Result<FeedConnection, TransportError> {
            let (stream, response) =
                connect_async(url).await.map_err(|e| TransportError::Connect(e.to_string()))?;
            debug!(%url, status = %response.status(), "websocket open");

            let (mut sink, mut source) = stream.split();
            let (connection, remote) = FeedConnection::pair(CHANNEL_CAPACITY);
            let RemoteEnd { incoming, mut outgoing } = remote;

            let pump = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        out = outgoing.recv() => match out {
                            Some(text) => {
                                if let Err(e) = sink.send(Message::Text(text.into())).await {
                                    warn!(error = %e, "websocket send failed");
                                    break;
                                }
                            },
                            None => {
                                let _ = sink.close().await;
                                break;
                            },
                        },
                        frame = source.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                if incoming.send(text.as_str().to_owned()).await.is_err() {
                                    break;
                                }
                            },
                            Some(Ok(Message::Close(frame))) => {
                                debug!(?frame, "websocket closed by server");
                                break;
                            },
                            Some(Ok(other)) => trace!(?other, "ignoring non-text frame"),
                            Some(Err(e)) => {
                                warn!(error = %e, "websocket receive failed");
                                break;
                            },
                            None => break,
                        },
                    }
                }
            });

            Ok(connection.with_abort(pump.abort_handle()))
        }
    }
}
