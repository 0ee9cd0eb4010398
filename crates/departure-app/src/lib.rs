//! Application layer for the departure board
//!
//! Pure state machines and a generic runtime, so the same orchestration code
//! runs in the terminal binary and in deterministic simulation.
//!
//! # Components
//!
//! - [`App`]: Board state machine (connection, pagination, status)
//! - [`PaginationEngine`]: Timed stop/page rotation
//! - [`BoardView`]: Render pipeline output for one frame
//! - [`Driver`]: Trait for display and input I/O
//! - [`Transport`]: Trait for opening feed connections
//! - [`Runtime`]: Generic orchestration loop on tokio

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod driver;
mod event;
pub mod format;
pub mod icon;
pub mod pagination;
mod runtime;
mod transport;
pub mod view;

pub use action::AppAction;
pub use app::App;
pub use driver::{Driver, DriverInput};
pub use event::AppEvent;
pub use format::from_now;
pub use icon::RealtimeIcon;
pub use pagination::{Page, PageTick, PaginationEngine};
pub use runtime::{DEFAULT_TICK_PERIOD, RunOutcome, Runtime};
pub use transport::{FeedConnection, RemoteEnd, Transport};
pub use view::{BoardView, Placeholder, RenderContext, Row};
