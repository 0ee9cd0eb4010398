//! Terminal driver for the board.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering.
//!
//! Keys: `q` or `Esc` quits, `r` forces a reconnect.

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use departure_app::{BoardView, Driver, DriverInput};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tracing::{info, warn};

use crate::ui;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    width: Option<usize>,
    active: bool,
}

impl TerminalDriver {
    /// Take over the terminal. `width` fixes the board width in cells;
    /// otherwise it follows the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or the alternate screen cannot be
    /// entered.
    pub fn new(width: Option<usize>) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, width, active: true })
    }

    /// Map a key press to board input.
    fn convert_key(code: KeyCode, modifiers: KeyModifiers) -> Option<DriverInput> {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(DriverInput::Quit),
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(DriverInput::Quit),
            KeyCode::Char('r' | 'R') => Some(DriverInput::Reconnect),
            _ => None,
        }
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "failed to leave raw mode");
        }
        if let Err(e) = stdout().execute(LeaveAlternateScreen) {
            warn!(error = %e, "failed to leave alternate screen");
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_input(&mut self) -> Result<Option<DriverInput>, Self::Error> {
        match self.event_stream.next().await {
            Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                Ok(Self::convert_key(key.code, key.modifiers))
            },
            Some(Ok(Event::Resize(..))) => Ok(Some(DriverInput::Resize)),
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => Err(TerminalError::Io(e)),
            None => std::future::pending().await,
        }
    }

    fn display_width(&self) -> usize {
        self.width.unwrap_or_else(|| match crossterm::terminal::size() {
            Ok((cols, _)) => ui::board_width(ratatui::layout::Rect::new(0, 0, cols, 1)),
            Err(_) => 0,
        })
    }

    fn render(&mut self, view: &BoardView) -> Result<(), Self::Error> {
        let width = self.width;
        self.terminal.draw(|frame| {
            let mut area = frame.area();
            if let Some(width) = width {
                let cells = u16::try_from(width.saturating_add(2)).unwrap_or(u16::MAX);
                area.width = area.width.min(cells);
            }
            ui::render(frame, view, area);
        })?;
        Ok(())
    }

    fn restart(&mut self) {
        info!("restart requested, releasing terminal");
    }

    fn stop(&mut self) {
        self.restore();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.restore();
    }
}
