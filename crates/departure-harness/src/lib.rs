//! Deterministic simulation harness for departure board testing.
//!
//! In-memory implementations of the Environment, Driver, and Transport traits
//! so the production [`departure_app::Runtime`] runs under tokio's paused
//! clock with scripted connections, a settable wall clock, and a settable
//! link.
//!
//! # Components
//!
//! - [`SimEnv`]: Virtual monotonic clock, wall clock, and link state
//! - [`SimDriver`]: Records every rendered view, scripted input
//! - [`SimTransport`]: Scripted connect outcomes; accepted connections are
//!   handed to the test as [`departure_app::RemoteEnd`]s
//! - [`fixtures`]: Feed messages and board configurations

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_transport;

pub use sim_driver::{SimDriver, SimDriverError, SimDriverHandle};
pub use sim_env::SimEnv;
pub use sim_transport::{ConnectScript, SimFeed, SimTransport};
