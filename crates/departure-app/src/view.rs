//! Render pipeline.
//!
//! Builds a [`BoardView`] for one frame from the current board state. The
//! view is a plain value: text, colors, and cell positions are all decided
//! here so drivers only paint.
//!
//! # Presentation priority
//!
//! The first matching condition wins:
//!
//! 1. Network link down
//! 2. No trusted time
//! 3. No feed endpoint configured
//! 4. Error status flagged
//! 5. Never connected
//! 6. No stops configured
//! 7. Stop-name page or schedule page, as selected by pagination
//!
//! # Row layout
//!
//! ```text
//! |44  Downtown Tra  )) 5min|
//!  ^   ^             ^  ^
//!  |   headsign_x    |  time_x (right aligned)
//!  route column      icon_x (realtime only)
//! ```
//!
//! The headsign is clipped without an ellipsis and always ends at least one
//! cell before the icon or time.

use departure_core::{DisplaySettings, Rgb, Status, StopRegistry, Trip, TripCache};

use crate::{format::from_now, icon::RealtimeIcon, pagination::Page};

/// Color of informational placeholders.
pub const NEUTRAL_COLOR: Rgb = Rgb::new(0x25_26_27);

/// Color of the error placeholder.
pub const ERROR_COLOR: Rgb = Rgb::new(0xFE_4C_5C);

/// Color of the stop name on the name page.
pub const STOP_NAME_COLOR: Rgb = Rgb::new(0x00_AE_EF);

/// Color of realtime times.
pub const REALTIME_COLOR: Rgb = Rgb::new(0x20_FF_00);

/// Color of scheduled times.
pub const SCHEDULED_COLOR: Rgb = Rgb::new(0xA7_A7_A7);

/// Width of the realtime icon in cells.
pub const ICON_WIDTH: usize = 3;

/// Placeholder shown instead of stop content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Network link is down
    Connecting,
    /// Wall clock is not trusted yet
    WaitingForTime,
    /// No feed endpoint configured
    NotConfigured,
    /// Error status is flagged
    Error,
    /// No connection has opened yet
    Loading,
    /// Stop registry is empty
    NoStops,
    /// Current stop has no trips
    NoUpcoming {
        /// Whether times are departures rather than arrivals
        departures: bool,
    },
}

impl Placeholder {
    /// Text shown centered on the board.
    pub fn text(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting to network",
            Self::WaitingForTime => "Waiting for time sync",
            Self::NotConfigured => "No feed URL set",
            Self::Error => "Error loading schedule",
            Self::Loading => "Loading...",
            Self::NoStops => "No stops configured",
            Self::NoUpcoming { departures: true } => "No upcoming departures",
            Self::NoUpcoming { departures: false } => "No upcoming arrivals",
        }
    }

    /// Text color.
    pub fn color(self) -> Rgb {
        match self {
            Self::Error => ERROR_COLOR,
            _ => NEUTRAL_COLOR,
        }
    }
}

/// Realtime icon placed on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedIcon {
    /// First cell of the icon
    pub x: usize,
    /// Animation frame
    pub icon: RealtimeIcon,
}

/// One schedule row, laid out for a fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Route label, drawn at cell 0
    pub route: String,
    /// Route label color
    pub route_color: Rgb,
    /// Headsign, already clipped
    pub headsign: String,
    /// First cell of the headsign
    pub headsign_x: usize,
    /// Time-until text
    pub time: String,
    /// Time color
    pub time_color: Rgb,
    /// First cell of the time text
    pub time_x: usize,
    /// Realtime icon, for realtime trips
    pub icon: Option<PlacedIcon>,
}

/// Everything visible on the board for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardView {
    /// Centered status text
    Placeholder(Placeholder),
    /// Stop name over a subtitle
    StopName {
        /// Stop display name
        name: String,
        /// `Upcoming Departures` or `Upcoming Arrivals`
        subtitle: &'static str,
    },
    /// Upcoming trips for the current stop
    Schedule {
        /// Rows in cache order
        rows: Vec<Row>,
    },
}

/// Inputs to the render pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Network link status
    pub link_up: bool,
    /// Trusted wall clock in unix milliseconds
    pub wall_clock_millis: Option<i64>,
    /// Whether a feed endpoint is configured
    pub feed_configured: bool,
    /// Current error status
    pub status: &'a Status,
    /// Whether any connection has ever opened
    pub has_ever_connected: bool,
    /// Stops in rotation order
    pub stops: &'a StopRegistry,
    /// Page selected by pagination
    pub page: Page,
    /// Shared trip snapshot
    pub cache: &'a TripCache,
    /// Presentation settings
    pub display: DisplaySettings,
    /// Show departure rather than arrival times
    pub sort_by_departure: bool,
}

impl BoardView {
    /// Build the view for a board `width` cells wide.
    pub fn build(ctx: &RenderContext<'_>, width: usize) -> Self {
        if !ctx.link_up {
            return Self::Placeholder(Placeholder::Connecting);
        }
        let Some(wall_clock_millis) = ctx.wall_clock_millis else {
            return Self::Placeholder(Placeholder::WaitingForTime);
        };
        if !ctx.feed_configured {
            return Self::Placeholder(Placeholder::NotConfigured);
        }
        if ctx.status.has_error() {
            return Self::Placeholder(Placeholder::Error);
        }
        if !ctx.has_ever_connected {
            return Self::Placeholder(Placeholder::Loading);
        }
        let Some(stop) = ctx.stops.get(ctx.page.stop_index()) else {
            return Self::Placeholder(Placeholder::NoStops);
        };

        match ctx.page {
            Page::StopName { .. } => Self::StopName {
                name: stop.name.clone(),
                subtitle: if ctx.sort_by_departure {
                    "Upcoming Departures"
                } else {
                    "Upcoming Arrivals"
                },
            },
            Page::Schedule { .. } => {
                let trips = ctx.cache.read_matching(&stop.id, ctx.display.limit);
                if trips.is_empty() {
                    return Self::Placeholder(Placeholder::NoUpcoming {
                        departures: ctx.sort_by_departure,
                    });
                }
                Self::Schedule { rows: layout_rows(ctx, &trips, wall_clock_millis, width) }
            },
        }
    }

    /// Placeholder text, if this view is a placeholder.
    pub fn placeholder_text(&self) -> Option<&'static str> {
        match self {
            Self::Placeholder(placeholder) => Some(placeholder.text()),
            Self::StopName { .. } | Self::Schedule { .. } => None,
        }
    }
}

fn layout_rows(ctx: &RenderContext<'_>, trips: &[Trip], wall_clock_millis: i64, width: usize) -> Vec<Row> {
    let now = wall_clock_millis.div_euclid(1000);
    let icon = RealtimeIcon::at(wall_clock_millis);
    let route_column = trips.iter().map(|t| t.route_name.chars().count()).max().unwrap_or(0);
    let headsign_x = route_column + 1;

    trips
        .iter()
        .map(|trip| {
            let time = from_now(trip.display_time(ctx.sort_by_departure), Some(now), ctx.display.units);
            let time_x = width.saturating_sub(time.chars().count());
            let (icon, boundary) = if trip.is_realtime {
                let x = time_x.saturating_sub(ICON_WIDTH + 1);
                (Some(PlacedIcon { x, icon }), x)
            } else {
                (None, time_x)
            };

            let clip_end = boundary.saturating_sub(1);
            let available = clip_end.saturating_sub(headsign_x);

            Row {
                route: trip.route_name.clone(),
                route_color: trip.route_color,
                headsign: trip.headsign.chars().take(available).collect(),
                headsign_x,
                time,
                time_color: if trip.is_realtime { REALTIME_COLOR } else { SCHEDULED_COLOR },
                time_x,
                icon,
            }
        })
        .collect()
}
