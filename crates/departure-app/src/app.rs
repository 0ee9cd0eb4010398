//! Board state machine.
//!
//! [`App`] owns everything the foreground context mutates: the connection
//! manager, the pagination engine, and the error status. It consumes
//! [`AppEvent`]s and produces [`AppAction`]s for the runtime to execute. Time,
//! trusted wall clock, and link status come from the [`Environment`].
//!
//! # Responsibilities
//!
//! - Drives connection liveness and pagination on every tick
//! - Turns feed notifications into connection and status updates
//! - Builds the [`BoardView`] for the current frame

use departure_core::{
    BoardConfig, ConnectionAction, ConnectionConfig, ConnectionManager, DisplaySettings,
    Environment, FeedSettings, Status, StatusKind, StopRegistry, TripCache,
};
use tracing::{debug, info, warn};

use crate::{
    AppAction, AppEvent,
    pagination::{PageTick, PaginationEngine},
    view::{BoardView, RenderContext},
};

/// Board state machine.
///
/// No I/O: reads the environment and returns actions.
#[derive(Debug)]
pub struct App<E: Environment> {
    env: E,
    feed: FeedSettings,
    display: DisplaySettings,
    stops: StopRegistry,
    cache: TripCache,
    connection: ConnectionManager<E::Instant>,
    pagination: PaginationEngine<E::Instant>,
    status: Status,
}

impl<E: Environment> App<E> {
    /// Create a board reading trips from `cache`.
    pub fn new(env: E, config: &BoardConfig, cache: TripCache) -> Self {
        Self {
            env,
            feed: config.feed.clone(),
            display: config.display,
            stops: config.stops.clone(),
            cache,
            connection: ConnectionManager::new(ConnectionConfig::from(&config.feed)),
            pagination: PaginationEngine::new(),
            status: Status::default(),
        }
    }

    /// Make the first connection attempt.
    pub fn start(&mut self) -> Vec<AppAction> {
        info!(stops = self.stops.len(), "starting departure board");
        let actions = self.connection.connect(self.env.now(), self.env.link_up());
        let mut actions = self.apply(actions);
        actions.push(AppAction::Render);
        actions
    }

    /// Close the connection for good.
    pub fn shutdown(&mut self) -> Vec<AppAction> {
        let actions = self.connection.close(true);
        self.apply(actions)
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        let now = self.env.now();
        match event {
            AppEvent::Tick => {
                let actions = self.connection.tick(
                    now,
                    self.env.wall_clock(),
                    &self.cache,
                    self.env.link_up(),
                );
                let mut actions = self.apply(actions);
                if let PageTick::Switched(page) = self.pagination.tick(now, &self.stops) {
                    debug!(?page, "page switched");
                }
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::Reconnect => {
                info!("manual reconnect");
                let actions = self.connection.reconnect(now, self.env.link_up());
                self.apply(actions)
            },
            AppEvent::Opened { generation } => {
                let actions = self.connection.on_open(generation, now);
                let mut actions = self.apply(actions);
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::OpenFailed { generation, reason } => {
                let actions = self.connection.on_open_failed(generation, now, &reason);
                self.apply(actions)
            },
            AppEvent::Heartbeat { generation } => {
                self.connection.on_heartbeat(generation, now);
                Vec::new()
            },
            AppEvent::ScheduleUpdated { generation, trips } => {
                debug!(generation, trips, "schedule updated");
                self.status.clear_kinds(&[StatusKind::Payload, StatusKind::Resource]);
                vec![AppAction::Render]
            },
            AppEvent::DecodeFailed { generation, error } => {
                warn!(generation, %error, "dropping feed message");
                let kind = if error.is_resource_exhaustion() {
                    StatusKind::Resource
                } else {
                    StatusKind::Payload
                };
                self.status.set_error(kind, error.to_string());
                vec![AppAction::Render]
            },
            AppEvent::SendFailed { generation, reason } => {
                warn!(generation, %reason, "send failed, closing connection");
                vec![AppAction::Close { generation }]
            },
            AppEvent::Closed { generation } => {
                self.connection.on_closed(generation, now);
                vec![AppAction::Render]
            },
        }
    }

    /// Build the view for a board `width` cells wide.
    pub fn view(&self, width: usize) -> BoardView {
        let ctx = RenderContext {
            link_up: self.env.link_up(),
            wall_clock_millis: self.env.wall_clock_millis(),
            feed_configured: self.connection.has_url(),
            status: &self.status,
            has_ever_connected: self.connection.has_ever_connected(),
            stops: &self.stops,
            page: self.pagination.current_page(),
            cache: &self.cache,
            display: self.display,
            sort_by_departure: self.feed.sort_by_departure,
        };
        BoardView::build(&ctx, width)
    }

    /// Connection manager state.
    pub fn connection(&self) -> &ConnectionManager<E::Instant> {
        &self.connection
    }

    /// Pagination state.
    pub fn pagination(&self) -> &PaginationEngine<E::Instant> {
        &self.pagination
    }

    /// Current error status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Shared trip snapshot.
    pub fn cache(&self) -> &TripCache {
        &self.cache
    }

    /// Apply status changes locally and pass the rest to the runtime.
    fn apply(&mut self, actions: Vec<ConnectionAction>) -> Vec<AppAction> {
        actions
            .into_iter()
            .filter_map(|action| match action {
                ConnectionAction::Open { generation, url } => Some(AppAction::Open { generation, url }),
                ConnectionAction::Send { generation, text } => Some(AppAction::Send { generation, text }),
                ConnectionAction::Close { generation } => Some(AppAction::Close { generation }),
                ConnectionAction::SetError(message) => {
                    self.status.set_error(StatusKind::Connection, message);
                    None
                },
                ConnectionAction::ClearError => {
                    self.status.clear();
                    None
                },
                ConnectionAction::Restart => Some(AppAction::Restart),
            })
            .collect()
    }
}
