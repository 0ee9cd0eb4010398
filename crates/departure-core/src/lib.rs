//! Departure board core
//!
//! Pure state and logic for a live departure board: the shared trip cache,
//! the schedule decoder that fills it, and the connection manager that keeps
//! the feed subscription alive. Nothing here performs I/O; time is passed in
//! and side effects come back as actions for a driver to execute.
//!
//! # Components
//!
//! - [`TripCache`]: Snapshot of upcoming trips shared between the transport
//!   context (writer) and the tick context (readers)
//! - [`ScheduleDecoder`]: Turns raw feed text into styled [`Trip`]s
//! - [`ConnectionManager`]: Connect/backoff/heartbeat/watchdog state machine
//! - [`Status`]: Persistent error flag surfaced on the board
//! - [`Environment`]: Clock, trusted wall clock, and link status

#![forbid(unsafe_code)]

pub mod cache;
pub mod color;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod env;
pub mod error;
pub mod rules;
pub mod status;
pub mod trip;

pub use cache::TripCache;
pub use color::Rgb;
pub use config::{BoardConfig, DisplaySettings, FeedSettings, Stop, StopRegistry, UnitDisplay};
pub use connection::{ConnectionAction, ConnectionConfig, ConnectionManager, ConnectionPhase};
pub use decoder::{DecodeOutcome, ScheduleDecoder};
pub use env::{Environment, MonotonicInstant};
pub use error::{DecodeError, RuleError, TransportError};
pub use rules::{AbbreviationTable, DecoderRules, RouteStyle, RouteStyleTable};
pub use status::{Status, StatusError, StatusKind};
pub use trip::Trip;
