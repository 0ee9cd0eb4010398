//! Departure board binary.
//!
//! # Usage
//!
//! ```bash
//! # Run with the default config file and log file
//! departure-tui
//!
//! # Fixed 40-cell board, verbose logs
//! departure-tui --config board.yaml --width 40 --log-level debug
//! ```
//!
//! Exits with status 75 when the board gives up on the feed, so a process
//! supervisor restarts it. `SIGHUP` reloads the abbreviation and route style
//! rules from the config file without reconnecting.

use std::{fs::OpenOptions, path::PathBuf, process::ExitCode, sync::Mutex};

use clap::Parser;
use departure_app::{RunOutcome, Runtime};
use departure_tui::{Config, LinkCheck, SystemEnv, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status asking a supervisor for a restart (`EX_TEMPFAIL`).
const EXIT_RESTART: u8 = 75;

/// Live departure board
#[derive(Parser, Debug)]
#[command(name = "departure-tui")]
#[command(about = "Live transit departure board for the terminal")]
#[command(version)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "departure-board.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file; the terminal belongs to the board
    #[arg(long, default_value = "departure-board.log")]
    log_file: PathBuf,

    /// Board width in cells (defaults to the terminal width)
    #[arg(short, long)]
    width: Option<usize>,

    /// Treat the network link as always up
    #[arg(long)]
    assume_link_up: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_file = OpenOptions::new().create(true).append(true).open(&args.log_file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(filter)
        .init();

    tracing::info!("departure board starting");

    let config = Config::load(&args.config)?;
    let board = config.board_config()?;
    board.log_summary();

    let link = if args.assume_link_up { LinkCheck::Assume } else { LinkCheck::default() };
    let driver = TerminalDriver::new(args.width)?;
    let runtime = Runtime::new(driver, transport(), SystemEnv::new(link), &board);

    #[cfg(unix)]
    reload::spawn(args.config.clone(), runtime.decoder())?;

    let outcome = runtime.run().await?;
    tracing::info!(?outcome, "departure board stopped");

    Ok(match outcome {
        RunOutcome::Restart => ExitCode::from(EXIT_RESTART),
        RunOutcome::Quit | RunOutcome::Interrupted => ExitCode::SUCCESS,
    })
}

#[cfg(feature = "websocket")]
fn transport() -> departure_tui::WebSocketTransport {
    departure_tui::WebSocketTransport
}

#[cfg(not(feature = "websocket"))]
fn transport() -> departure_tui::UnsupportedTransport {
    departure_tui::UnsupportedTransport
}

#[cfg(unix)]
mod reload {
    use std::path::{Path, PathBuf};

    use departure_core::ScheduleDecoder;
    use departure_tui::Config;
    use tokio::signal::unix::{SignalKind, signal};

    /// Reload decoder rules from `path` on every `SIGHUP`.
    pub fn spawn(path: PathBuf, decoder: ScheduleDecoder) -> std::io::Result<()> {
        let mut hangups = signal(SignalKind::hangup())?;
        tokio::spawn(async move {
            while hangups.recv().await.is_some() {
                reload_rules(&path, &decoder);
            }
        });
        Ok(())
    }

    fn reload_rules(path: &Path, decoder: &ScheduleDecoder) {
        match Config::load(path).and_then(|config| config.rules()) {
            Ok(rules) => {
                tracing::info!(
                    abbreviations = rules.abbreviations.len(),
                    route_styles = rules.route_styles.len(),
                    "reloaded decoder rules"
                );
                decoder.set_rules(rules);
            },
            Err(e) => tracing::warn!(error = %e, "keeping current decoder rules"),
        }
    }
}
