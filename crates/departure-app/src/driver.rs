//! Driver trait for abstracting display and input.
//!
//! The [`Driver`] trait decouples the runtime from a specific frontend. Each
//! frontend implements it to paint [`BoardView`]s and report user input,
//! while the generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use crate::BoardView;

/// Input reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverInput {
    /// Stop the board.
    Quit,
    /// Force a reconnect.
    Reconnect,
    /// Display size changed; redraw.
    Resize,
}

/// Abstracts display and input for the runtime.
///
/// # Implementations
///
/// - **TUI**: ratatui over crossterm
/// - **Simulation**: records every rendered view, scripted input
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` for input the board does not act on. Must stay pending
    /// rather than return immediately when nothing happens.
    fn poll_input(&mut self) -> impl Future<Output = Result<Option<DriverInput>, Self::Error>> + Send;

    /// Board width in character cells.
    fn display_width(&self) -> usize;

    /// Paint one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be drawn. The runtime logs
    /// render errors and carries on.
    fn render(&mut self, view: &BoardView) -> Result<(), Self::Error>;

    /// Called once before the runtime returns with a restart request.
    fn restart(&mut self);

    /// Release display resources.
    fn stop(&mut self);
}
