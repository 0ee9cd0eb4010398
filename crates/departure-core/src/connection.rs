//! Feed connection manager.
//!
//! Keeps one streaming subscription alive: connects, subscribes, tracks
//! heartbeats, backs off on failure, and forces a reconnect when the session
//! goes quiet or the schedule goes stale. Uses the action pattern: methods
//! take time as input and return actions for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//!                connect()              on_open()
//! ┌──────────────┐ ───────> ┌────────────┐ ───────> ┌───────────┐
//! │ Disconnected │          │ Connecting │          │ Connected │
//! └──────────────┘ <─────── └────────────┘          └───────────┘
//!        ↑       on_open_failed()                         │
//!        │                                                │ close()
//!        │            on_closed()        ┌─────────┐      │
//!        └────────────────────────────── │ Closing │ <────┘
//!                                        └─────────┘
//! ```
//!
//! Every transport attempt is stamped with a generation. Reports carrying an
//! older generation belong to a superseded connection and are ignored.
//!
//! # Timers
//!
//! - Pending reconnect: one-shot, armed by a failed attempt (backoff) or a
//!   transport close (due immediately, fires on the next tick)
//! - Watchdog: periodic; while connected, reconnects if any cached trip
//!   departed more than a minute ago
//! - Liveness: once a heartbeat has been seen, reconnects if the next one is
//!   more than a minute late

use std::time::Duration;

use departure_proto::SubscribeRequest;
use tracing::{debug, error, trace, warn};

use crate::{cache::TripCache, config::FeedSettings, env::MonotonicInstant};

/// Linear backoff step per failed attempt.
pub const BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Backoff ceiling.
pub const MAX_BACKOFF: Duration = Duration::from_secs(15);

/// Failed attempts after which the error status is raised.
pub const ERROR_STATUS_THRESHOLD: u32 = 3;

/// Failed attempts after which a process restart is requested.
pub const RESTART_THRESHOLD: u32 = 15;

/// Period of the staleness watchdog.
pub const DEFAULT_WATCHDOG_PERIOD: Duration = Duration::from_secs(10);

/// Maximum gap between heartbeats.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long past its departure a cached trip may be before the schedule is
/// considered stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Ceiling for a single transport attempt or send, enforced by the runtime.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Retry delay after the `attempt`-th consecutive failure.
pub fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_STEP.saturating_mul(attempt).min(MAX_BACKOFF)
}

/// Actions returned by the connection manager.
///
/// The driver executes these:
/// - `Open`: start a transport attempt and report back with its generation
/// - `Send`: deliver text on the connection of that generation
/// - `Close`: tear down the connection of that generation
/// - `SetError` / `ClearError`: update the board status
/// - `Restart`: request a full process restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport connection
    Open {
        /// Attempt id to report back with
        generation: u64,
        /// Feed endpoint
        url: String,
    },

    /// Send a text message
    Send {
        /// Connection to send on
        generation: u64,
        /// Serialized message
        text: String,
    },

    /// Close a transport connection
    Close {
        /// Connection to close
        generation: u64,
    },

    /// Raise the connection error status
    SetError(String),

    /// Clear any error status
    ClearError,

    /// Request a full process restart
    Restart,
}

/// Lifecycle phase of the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No transport
    Disconnected,
    /// Transport attempt in flight
    Connecting,
    /// Open and subscribed
    Connected,
    /// Close requested, waiting for the transport to confirm
    Closing,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Feed endpoint; without one, `connect` does nothing
    pub url: Option<String>,
    /// Sent after every successful open
    pub subscribe: SubscribeRequest,
    /// Staleness watchdog period
    pub watchdog_period: Duration,
    /// Maximum gap between heartbeats
    pub heartbeat_timeout: Duration,
    /// Grace period after a cached trip's departure
    pub stale_after: Duration,
}

impl From<&FeedSettings> for ConnectionConfig {
    fn from(feed: &FeedSettings) -> Self {
        Self {
            url: feed.url.clone().filter(|url| !url.is_empty()),
            subscribe: feed.subscribe_request(),
            watchdog_period: DEFAULT_WATCHDOG_PERIOD,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// Why a reconnect is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectCause {
    /// Retry after a failed attempt
    Backoff {
        /// Consecutive failures so far
        attempt: u32,
    },
    /// The transport closed underneath us
    TransportClosed,
}

#[derive(Debug, Clone, Copy)]
struct PendingReconnect<I> {
    due: I,
    cause: ReconnectCause,
}

/// Connection manager
///
/// Pure state machine: no I/O and no clock. Generic over `Instant` so tests
/// can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I: MonotonicInstant> {
    config: ConnectionConfig,
    phase: ConnectionPhase,
    generation: u64,
    attempt_count: u32,
    last_heartbeat: Option<I>,
    has_ever_connected: bool,
    fully_closed: bool,
    restart_requested: bool,
    pending_reconnect: Option<PendingReconnect<I>>,
    watchdog: Option<I>,
}

impl<I: MonotonicInstant> ConnectionManager<I> {
    /// Create a disconnected manager. The watchdog arms on the first tick.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            phase: ConnectionPhase::Disconnected,
            generation: 0,
            attempt_count: 0,
            last_heartbeat: None,
            has_ever_connected: false,
            fully_closed: false,
            restart_requested: false,
            pending_reconnect: None,
            watchdog: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Generation of the most recent transport attempt
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Consecutive failed attempts since the last successful open
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// When the last heartbeat arrived on the current connection
    pub fn last_heartbeat(&self) -> Option<I> {
        self.last_heartbeat
    }

    /// Whether any connection has ever opened
    pub fn has_ever_connected(&self) -> bool {
        self.has_ever_connected
    }

    /// Whether `close(true)` has been called
    pub fn is_fully_closed(&self) -> bool {
        self.fully_closed
    }

    /// Whether the connection is open and subscribed
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Whether a feed endpoint is configured
    pub fn has_url(&self) -> bool {
        self.config.url.is_some()
    }

    /// Due time and cause of the pending reconnect, if any
    pub fn pending_reconnect(&self) -> Option<(I, ReconnectCause)> {
        self.pending_reconnect.map(|p| (p.due, p.cause))
    }

    /// Next watchdog deadline, once armed
    pub fn watchdog_due(&self) -> Option<I> {
        self.watchdog
    }

    /// Start a transport attempt.
    ///
    /// Does nothing when shut down, already connecting or connected, or when
    /// no endpoint is configured. With the link down the attempt counts as a
    /// failure and a retry is scheduled.
    pub fn connect(&mut self, now: I, link_up: bool) -> Vec<ConnectionAction> {
        if self.fully_closed {
            debug!("connection fully closed, not connecting");
            return Vec::new();
        }
        if matches!(self.phase, ConnectionPhase::Connecting | ConnectionPhase::Connected) {
            trace!(phase = ?self.phase, "connect ignored");
            return Vec::new();
        }
        let Some(url) = self.config.url.clone() else {
            warn!("no feed URL set, not connecting");
            return Vec::new();
        };

        self.last_heartbeat = None;
        self.pending_reconnect = None;

        if !link_up {
            return self.record_failure(now, "network link down");
        }

        self.generation += 1;
        self.phase = ConnectionPhase::Connecting;
        debug!(generation = self.generation, attempt = self.attempt_count + 1, %url, "connecting to feed");

        vec![ConnectionAction::Open { generation: self.generation, url }]
    }

    /// Transport attempt `generation` opened.
    ///
    /// Resets the failure count, clears the error status, and subscribes. An
    /// open for a superseded attempt is closed straight away.
    pub fn on_open(&mut self, generation: u64, _now: I) -> Vec<ConnectionAction> {
        if generation != self.generation || self.phase != ConnectionPhase::Connecting {
            debug!(generation, current = self.generation, "closing superseded connection");
            return vec![ConnectionAction::Close { generation }];
        }

        self.phase = ConnectionPhase::Connected;
        self.attempt_count = 0;
        self.has_ever_connected = true;
        debug!(generation, "connected to feed");

        let mut actions = vec![ConnectionAction::ClearError];
        match self.config.subscribe.encode() {
            Ok(text) => {
                trace!(%text, "subscribing");
                actions.push(ConnectionAction::Send { generation, text });
            },
            Err(error) => error!(%error, "could not encode subscribe request"),
        }
        actions
    }

    /// Transport attempt `generation` failed.
    ///
    /// A failure of an attempt that was already being closed counts as the
    /// close completing, not as a failed attempt.
    pub fn on_open_failed(&mut self, generation: u64, now: I, reason: &str) -> Vec<ConnectionAction> {
        if generation != self.generation {
            trace!(generation, "ignoring failure of superseded attempt");
            return Vec::new();
        }

        match self.phase {
            ConnectionPhase::Connecting => {
                self.phase = ConnectionPhase::Disconnected;
                self.record_failure(now, reason)
            },
            ConnectionPhase::Closing => {
                self.on_closed(generation, now);
                Vec::new()
            },
            ConnectionPhase::Disconnected | ConnectionPhase::Connected => Vec::new(),
        }
    }

    /// Heartbeat received on connection `generation`.
    pub fn on_heartbeat(&mut self, generation: u64, now: I) {
        if generation == self.generation && self.phase == ConnectionPhase::Connected {
            self.last_heartbeat = Some(now);
        }
    }

    /// Transport for `generation` closed, or a send on it failed.
    ///
    /// Unless shut down or a reconnect is already pending, schedules a
    /// reconnect due immediately. It fires on the next tick.
    pub fn on_closed(&mut self, generation: u64, now: I) {
        if generation != self.generation
            || !matches!(self.phase, ConnectionPhase::Connected | ConnectionPhase::Closing)
        {
            trace!(generation, "ignoring close of superseded connection");
            return;
        }

        debug!(generation, "feed connection closed");
        self.phase = ConnectionPhase::Disconnected;

        if !self.fully_closed && self.pending_reconnect.is_none() {
            self.pending_reconnect =
                Some(PendingReconnect { due: now, cause: ReconnectCause::TransportClosed });
        }
    }

    /// Close the current connection, then connect again.
    ///
    /// Cancels any pending reconnect.
    pub fn reconnect(&mut self, now: I, link_up: bool) -> Vec<ConnectionAction> {
        let mut actions = self.close(false);
        actions.extend(self.connect(now, link_up));
        actions
    }

    /// Close the current connection and cancel any pending reconnect.
    ///
    /// With `fully` set, latches the shut-down flag and stops the watchdog:
    /// nothing will connect again.
    pub fn close(&mut self, fully: bool) -> Vec<ConnectionAction> {
        if fully {
            debug!("closing feed connection for shutdown");
            self.fully_closed = true;
            self.watchdog = None;
        }
        self.pending_reconnect = None;

        match self.phase {
            ConnectionPhase::Connecting | ConnectionPhase::Connected => {
                self.phase = ConnectionPhase::Closing;
                vec![ConnectionAction::Close { generation: self.generation }]
            },
            ConnectionPhase::Disconnected | ConnectionPhase::Closing => Vec::new(),
        }
    }

    /// Process periodic maintenance: liveness, staleness watchdog, and the
    /// pending reconnect.
    ///
    /// `wall_clock` is trusted unix seconds; without it the watchdog cannot
    /// judge staleness and does nothing.
    pub fn tick(
        &mut self,
        now: I,
        wall_clock: Option<i64>,
        cache: &TripCache,
        link_up: bool,
    ) -> Vec<ConnectionAction> {
        if self.fully_closed {
            return Vec::new();
        }

        if let Some(last) = self.last_heartbeat {
            let elapsed = now - last;
            if elapsed > self.config.heartbeat_timeout {
                warn!(?elapsed, "heartbeat timeout, reconnecting");
                return self.reconnect(now, link_up);
            }
        }

        let period = self.config.watchdog_period;
        let watchdog_due = *self.watchdog.get_or_insert(now + period);
        if now >= watchdog_due {
            self.watchdog = Some(now + period);
            if self.phase == ConnectionPhase::Connected && self.is_stale(wall_clock, cache) {
                warn!("schedule is stale, reconnecting");
                return self.reconnect(now, link_up);
            }
        }

        if let Some(pending) = self.pending_reconnect
            && now >= pending.due
        {
            debug!(cause = ?pending.cause, "reconnect timer fired");
            self.pending_reconnect = None;
            return self.connect(now, link_up);
        }

        Vec::new()
    }

    fn is_stale(&self, wall_clock: Option<i64>, cache: &TripCache) -> bool {
        let grace = i64::try_from(self.config.stale_after.as_secs()).unwrap_or(i64::MAX);
        wall_clock.is_some_and(|now| cache.has_departed_before(now.saturating_sub(grace)))
    }

    fn record_failure(&mut self, now: I, reason: &str) -> Vec<ConnectionAction> {
        self.attempt_count = self.attempt_count.saturating_add(1);
        let attempt = self.attempt_count;
        let mut actions = Vec::new();

        if attempt >= ERROR_STATUS_THRESHOLD {
            actions.push(ConnectionAction::SetError(format!(
                "failed to connect to feed after {attempt} attempts"
            )));
        }

        if attempt >= RESTART_THRESHOLD && !self.restart_requested {
            error!(attempt, "too many failed connection attempts, requesting restart");
            self.restart_requested = true;
            actions.push(ConnectionAction::Restart);
        }

        let delay = backoff_delay(attempt);
        warn!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), %reason, "failed to connect, retrying");
        self.pending_reconnect =
            Some(PendingReconnect { due: now + delay, cause: ReconnectCause::Backoff { attempt } });

        actions
    }
}
