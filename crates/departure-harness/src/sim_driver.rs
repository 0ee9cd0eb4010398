//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`departure_app::Runtime`] orchestration code runs in both production and
//! simulation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use departure_app::{BoardView, Driver, DriverInput};
use tokio::sync::mpsc;

/// Default board width in cells.
pub const DEFAULT_WIDTH: usize = 32;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

#[derive(Debug, Default)]
struct SharedState {
    frames: Vec<BoardView>,
    render_failures: usize,
    restarted: bool,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Input is scripted through the paired [`SimDriverHandle`]. Once the handle
/// has been dropped and all input consumed, `poll_input` stays pending like
/// an idle terminal.
#[derive(Debug)]
pub struct SimDriver {
    width: usize,
    inputs: mpsc::UnboundedReceiver<Result<DriverInput, SimDriverError>>,
    state: Arc<Mutex<SharedState>>,
}

/// Test side of a [`SimDriver`].
#[derive(Debug, Clone)]
pub struct SimDriverHandle {
    inputs: mpsc::UnboundedSender<Result<DriverInput, SimDriverError>>,
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a driver `width` cells wide and the handle that scripts it.
    pub fn new(width: usize) -> (Self, SimDriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SharedState::default()));
        (Self { width, inputs: rx, state: state.clone() }, SimDriverHandle { inputs: tx, state })
    }

    /// Queue input before the runtime starts.
    pub fn with_input(self, handle: &SimDriverHandle, input: DriverInput) -> Self {
        handle.send(input);
        self
    }
}

impl SimDriverHandle {
    /// Deliver input to the driver.
    pub fn send(&self, input: DriverInput) {
        // Receiver gone means the runtime already stopped
        let _ = self.inputs.send(Ok(input));
    }

    /// Make the next input poll fail with `reason`.
    pub fn fail_input(&self, reason: &str) {
        let _ = self.inputs.send(Err(SimDriverError(reason.to_owned())));
    }

    /// Every frame rendered so far.
    pub fn frames(&self) -> Vec<BoardView> {
        self.lock().frames.clone()
    }

    /// Most recent frame.
    pub fn last_frame(&self) -> Option<BoardView> {
        self.lock().frames.last().cloned()
    }

    /// Number of frames rendered.
    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether any rendered frame showed `text` as its placeholder.
    pub fn has_shown(&self, text: &str) -> bool {
        self.lock().frames.iter().any(|frame| frame.placeholder_text() == Some(text))
    }

    /// Whether the runtime asked for a restart.
    pub fn restarted(&self) -> bool {
        self.lock().restarted
    }

    /// Whether the runtime released the display.
    pub fn stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Make the next `count` renders fail.
    pub fn fail_renders(&self, count: usize) {
        self.lock().render_failures = count;
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_input(&mut self) -> Result<Option<DriverInput>, Self::Error> {
        match self.inputs.recv().await {
            Some(Ok(input)) => Ok(Some(input)),
            Some(Err(e)) => Err(e),
            None => std::future::pending().await,
        }
    }

    fn display_width(&self) -> usize {
        self.width
    }

    fn render(&mut self, view: &BoardView) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.render_failures > 0 {
            state.render_failures -= 1;
            return Err(SimDriverError("render failed".into()));
        }
        state.frames.push(view.clone());
        Ok(())
    }

    fn restart(&mut self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).restarted = true;
    }

    fn stop(&mut self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use departure_app::Placeholder;

    use super::*;

    #[test]
    fn render_records_frames() {
        let (mut driver, handle) = SimDriver::new(DEFAULT_WIDTH);
        driver.render(&BoardView::Placeholder(Placeholder::Loading)).unwrap();

        assert_eq!(handle.frame_count(), 1);
        assert!(handle.has_shown("Loading..."));
    }

    #[test]
    fn scripted_render_failure_is_not_recorded() {
        let (mut driver, handle) = SimDriver::new(DEFAULT_WIDTH);
        handle.fail_renders(1);

        assert!(driver.render(&BoardView::Placeholder(Placeholder::Loading)).is_err());
        assert!(driver.render(&BoardView::Placeholder(Placeholder::Connecting)).is_ok());
        assert_eq!(handle.frames(), vec![BoardView::Placeholder(Placeholder::Connecting)]);
    }

    #[tokio::test]
    async fn poll_input_returns_scripted_input() {
        let (driver, handle) = SimDriver::new(DEFAULT_WIDTH);
        let mut driver = driver.with_input(&handle, DriverInput::Reconnect);

        assert_eq!(driver.poll_input().await.unwrap(), Some(DriverInput::Reconnect));
    }

    #[tokio::test]
    async fn scripted_input_failure_is_returned() {
        let (mut driver, handle) = SimDriver::new(DEFAULT_WIDTH);
        handle.fail_input("tty gone");

        let err = driver.poll_input().await.unwrap_err();
        assert_eq!(err.0, "tty gone");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_input_stays_pending_when_idle() {
        let (mut driver, handle) = SimDriver::new(DEFAULT_WIDTH);
        drop(handle);

        let polled =
            tokio::time::timeout(std::time::Duration::from_secs(60), driver.poll_input()).await;
        assert!(polled.is_err());
    }
}
