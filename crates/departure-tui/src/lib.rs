//! Terminal departure board
//!
//! A thin shell over [`departure_app::Driver`] and [`departure_app::Transport`]
//! that provides terminal rendering, a WebSocket feed transport, the system
//! environment, and the YAML configuration file. All orchestration lives in
//! the generic [`departure_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod system_env;
pub mod terminal;
pub mod transport;
pub mod ui;

pub use config::{Config, ConfigError};
pub use system_env::{LinkCheck, SystemEnv};
pub use terminal::{TerminalDriver, TerminalError};
pub use transport::UnsupportedTransport;
#[cfg(feature = "websocket")]
pub use transport::WebSocketTransport;
