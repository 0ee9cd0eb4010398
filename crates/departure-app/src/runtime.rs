//! Generic runtime for board orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`App`]: Board state machine (foreground context)
//! - [`Transport`]: Feed connections, one reader task per connection
//!   (transport context)
//! - [`Driver`]: Display and input
//!
//! Reader tasks decode inbound messages straight into the shared
//! [`TripCache`] and forward the outcome, tagged with the connection
//! generation, over one channel. The foreground loop selects over that
//! channel, a periodic tick, driver input, and ctrl-c, so the App is only
//! ever touched from one place.

use std::{collections::HashMap, time::Duration};

use departure_core::{
    BoardConfig, DecodeError, DecodeOutcome, Environment, ScheduleDecoder, TripCache,
    connection::CONNECT_TIMEOUT,
};
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, trace, warn};

use crate::{App, AppAction, AppEvent, Driver, DriverInput, FeedConnection, Transport};

/// Period of the foreground tick.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

const FEED_CHANNEL_CAPACITY: usize = 64;

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The driver asked to quit
    Quit,
    /// Interrupted by ctrl-c
    Interrupted,
    /// The connection manager gave up and asked for a process restart
    Restart,
}

/// Notifications from the transport context.
#[derive(Debug)]
enum FeedEvent {
    Opened { generation: u64, connection: FeedConnection },
    OpenFailed { generation: u64, reason: String },
    Decoded { generation: u64, outcome: DecodeOutcome },
    DecodeFailed { generation: u64, error: DecodeError },
    Closed { generation: u64 },
}

#[derive(Debug)]
struct ActiveConnection {
    outbound: mpsc::Sender<String>,
    reader: JoinHandle<()>,
    transport_task: Option<AbortHandle>,
}

impl ActiveConnection {
    fn close(self) {
        self.reader.abort();
        if let Some(task) = self.transport_task {
            task.abort();
        }
    }
}

/// Generic runtime that orchestrates App, Transport, and Driver.
///
/// # Type Parameters
///
/// - `D`: Display and input driver
/// - `T`: Feed transport
/// - `E`: Environment (clock, wall clock, link status)
pub struct Runtime<D, T, E>
where
    D: Driver,
    T: Transport,
    E: Environment,
{
    driver: D,
    transport: T,
    app: App<E>,
    decoder: ScheduleDecoder,
    cache: TripCache,
    feed_tx: mpsc::Sender<FeedEvent>,
    feed_rx: mpsc::Receiver<FeedEvent>,
    connections: HashMap<u64, ActiveConnection>,
    tick_period: Duration,
}

impl<D, T, E> Runtime<D, T, E>
where
    D: Driver,
    T: Transport,
    E: Environment,
{
    /// Create a runtime for `config`.
    pub fn new(driver: D, transport: T, env: E, config: &BoardConfig) -> Self {
        let cache = TripCache::new();
        let decoder = ScheduleDecoder::new(config.rules.clone());
        let app = App::new(env, config, cache.clone());
        let (feed_tx, feed_rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        Self {
            driver,
            transport,
            app,
            decoder,
            cache,
            feed_tx,
            feed_rx,
            connections: HashMap::new(),
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }

    /// Override the tick period.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Handle to the decoder, for reloading rules while running.
    pub fn decoder(&self) -> ScheduleDecoder {
        self.decoder.clone()
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App<E> {
        &self.app
    }

    /// Run the event loop until quit, ctrl-c, or a restart request.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll input; the feed is closed
    /// and the driver stopped first. Render errors are logged and do not stop
    /// the loop.
    pub async fn run(mut self) -> Result<RunOutcome, D::Error> {
        let actions = self.app.start();
        if let Some(outcome) = self.process_actions(actions).await {
            return Ok(self.finish(outcome).await);
        }

        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            let actions = tokio::select! {
                Some(event) = self.feed_rx.recv() => self.handle_feed_event(event),
                _ = ticker.tick() => self.app.handle(AppEvent::Tick),
                input = self.driver.poll_input() => match input {
                    Ok(Some(DriverInput::Quit)) => break Ok(RunOutcome::Quit),
                    Ok(Some(DriverInput::Reconnect)) => self.app.handle(AppEvent::Reconnect),
                    Ok(Some(DriverInput::Resize)) => vec![AppAction::Render],
                    Ok(None) => Vec::new(),
                    Err(e) => break Err(e),
                },
                _ = tokio::signal::ctrl_c() => break Ok(RunOutcome::Interrupted),
            };

            if let Some(outcome) = self.process_actions(actions).await {
                break Ok(outcome);
            }
        };

        match outcome {
            Ok(outcome) => Ok(self.finish(outcome).await),
            Err(e) => {
                error!(error = %e, "driver input failed, stopping departure board");
                self.close_feed().await;
                self.driver.stop();
                Err(e)
            },
        }
    }

    async fn finish(&mut self, outcome: RunOutcome) -> RunOutcome {
        info!(?outcome, "stopping departure board");
        self.close_feed().await;
        if outcome == RunOutcome::Restart {
            self.driver.restart();
        }
        self.driver.stop();
        outcome
    }

    /// Close the feed for good and tear down every live connection.
    async fn close_feed(&mut self) {
        let actions = self.app.shutdown();
        self.process_actions(actions).await;
        for (_, connection) in self.connections.drain() {
            connection.close();
        }
    }

    fn handle_feed_event(&mut self, event: FeedEvent) -> Vec<AppAction> {
        match event {
            FeedEvent::Opened { generation, connection } => {
                self.adopt(generation, connection);
                self.app.handle(AppEvent::Opened { generation })
            },
            FeedEvent::OpenFailed { generation, reason } => {
                self.app.handle(AppEvent::OpenFailed { generation, reason })
            },
            FeedEvent::Decoded { generation, outcome: DecodeOutcome::Heartbeat } => {
                self.app.handle(AppEvent::Heartbeat { generation })
            },
            FeedEvent::Decoded { generation, outcome: DecodeOutcome::ScheduleReplaced { trips } } => {
                self.app.handle(AppEvent::ScheduleUpdated { generation, trips })
            },
            FeedEvent::DecodeFailed { generation, error } => {
                self.app.handle(AppEvent::DecodeFailed { generation, error })
            },
            FeedEvent::Closed { generation } => {
                if let Some(connection) = self.connections.remove(&generation) {
                    connection.close();
                }
                self.app.handle(AppEvent::Closed { generation })
            },
        }
    }

    /// Execute actions until none are left.
    ///
    /// Returns the outcome if an action ends the run.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Option<RunOutcome> {
        let mut pending_actions = initial_actions;
        let mut outcome = None;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.render(),
                    AppAction::Open { generation, url } => self.open(generation, url),
                    AppAction::Send { generation, text } => {
                        if let Err(reason) = self.send(generation, text).await {
                            pending_actions.extend(self.app.handle(AppEvent::SendFailed { generation, reason }));
                        }
                    },
                    AppAction::Close { generation } => {
                        if let Some(connection) = self.connections.remove(&generation) {
                            debug!(generation, "closing feed connection");
                            connection.close();
                            pending_actions.extend(self.app.handle(AppEvent::Closed { generation }));
                        }
                    },
                    AppAction::Restart => outcome = Some(RunOutcome::Restart),
                }
            }
        }
        outcome
    }

    fn render(&mut self) {
        let view = self.app.view(self.driver.display_width());
        if let Err(e) = self.driver.render(&view) {
            warn!(error = %e, "failed to render");
        }
    }

    /// Start a transport attempt on its own task, bounded by the connect
    /// timeout. The result comes back through the feed channel.
    fn open(&mut self, generation: u64, url: String) {
        let transport = self.transport.clone();
        let events = self.feed_tx.clone();
        tokio::spawn(async move {
            let event = match tokio::time::timeout(CONNECT_TIMEOUT, transport.connect(&url)).await {
                Ok(Ok(connection)) => FeedEvent::Opened { generation, connection },
                Ok(Err(e)) => FeedEvent::OpenFailed { generation, reason: e.to_string() },
                Err(_) => FeedEvent::OpenFailed {
                    generation,
                    reason: format!("timed out after {CONNECT_TIMEOUT:?}"),
                },
            };
            if events.send(event).await.is_err() {
                trace!(generation, "runtime gone, dropping connect result");
            }
        });
    }

    fn adopt(&mut self, generation: u64, connection: FeedConnection) {
        let (outbound, inbound, transport_task) = connection.into_parts();
        let reader = tokio::spawn(read_feed(
            generation,
            inbound,
            self.decoder.clone(),
            self.cache.clone(),
            self.feed_tx.clone(),
        ));
        let previous = self
            .connections
            .insert(generation, ActiveConnection { outbound, reader, transport_task });
        if let Some(previous) = previous {
            previous.close();
        }
    }

    async fn send(&mut self, generation: u64, text: String) -> Result<(), String> {
        let Some(connection) = self.connections.get(&generation) else {
            return Err("connection not open".to_owned());
        };
        trace!(generation, %text, "sending");
        match tokio::time::timeout(CONNECT_TIMEOUT, connection.outbound.send(text)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err("connection closed".to_owned()),
            Err(_) => Err(format!("timed out after {CONNECT_TIMEOUT:?}")),
        }
    }
}

/// Reader task: decodes every inbound message into the cache and reports the
/// outcome. Reports `Closed` when the transport closes.
async fn read_feed(
    generation: u64,
    mut inbound: mpsc::Receiver<String>,
    decoder: ScheduleDecoder,
    cache: TripCache,
    events: mpsc::Sender<FeedEvent>,
) {
    while let Some(text) = inbound.recv().await {
        trace!(generation, %text, "received message");
        let event = match decoder.handle(&text, &cache) {
            Ok(outcome) => FeedEvent::Decoded { generation, outcome },
            Err(error) => FeedEvent::DecodeFailed { generation, error },
        };
        if events.send(event).await.is_err() {
            return;
        }
    }

    debug!(generation, "feed connection closed by remote");
    let _ = events.send(FeedEvent::Closed { generation }).await;
}
