//! Simulated environment.
//!
//! [`SimEnv`] has two clock modes. A manual clock only moves when the test
//! calls [`SimEnv::advance`], which suits driving [`departure_app::App`] by
//! hand. A runtime clock follows tokio's clock, so with
//! `#[tokio::test(start_paused = true)]` the board's timers and the runtime's
//! tick interval advance together.
//!
//! The wall clock is derived from the monotonic clock: it starts at a
//! settable base and moves with it. It can also be unset to simulate a host
//! that has not synced its time yet.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use departure_core::Environment;
use tokio::time::Instant;

/// Default wall clock at simulation start: 2023-11-14T22:13:20Z.
pub const DEFAULT_WALL_CLOCK_MILLIS: i64 = 1_700_000_000_000;

#[derive(Debug)]
struct EnvState {
    offset: Duration,
    wall_clock_base: Option<i64>,
    link_up: bool,
}

/// Simulated environment with a virtual clock and settable host state.
///
/// Clones share state, so a test can keep a handle after passing the
/// environment to the board.
#[derive(Debug, Clone)]
pub struct SimEnv {
    origin: Instant,
    follow_runtime: bool,
    state: Arc<Mutex<EnvState>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Manual clock. Time only moves through [`Self::advance`].
    pub fn new() -> Self {
        Self::with_mode(false)
    }

    /// Clock that follows tokio's clock, plus anything added through
    /// [`Self::advance`].
    pub fn on_runtime() -> Self {
        Self::with_mode(true)
    }

    #[allow(clippy::disallowed_methods)]
    fn with_mode(follow_runtime: bool) -> Self {
        Self {
            origin: Instant::now(),
            follow_runtime,
            state: Arc::new(Mutex::new(EnvState {
                offset: Duration::ZERO,
                wall_clock_base: Some(DEFAULT_WALL_CLOCK_MILLIS),
                link_up: true,
            })),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        self.lock().offset += duration;
    }

    /// Set the wall clock to `millis` at the current instant, or unset it.
    pub fn set_wall_clock_millis(&self, millis: Option<i64>) {
        let elapsed = self.elapsed_millis();
        self.lock().wall_clock_base = millis.map(|ms| ms - elapsed);
    }

    /// Set the wall clock to `secs` unix seconds at the current instant.
    pub fn set_wall_clock(&self, secs: i64) {
        self.set_wall_clock_millis(Some(secs * 1000));
    }

    /// Bring the link up or down.
    pub fn set_link_up(&self, up: bool) {
        self.lock().link_up = up;
    }

    /// Virtual time since the environment was created.
    pub fn elapsed(&self) -> Duration {
        self.now() - self.origin
    }

    fn elapsed_millis(&self) -> i64 {
        i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    fn lock(&self) -> MutexGuard<'_, EnvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Instant {
        let base = if self.follow_runtime { Instant::now() } else { self.origin };
        base + self.lock().offset
    }

    fn wall_clock_millis(&self) -> Option<i64> {
        let base = self.lock().wall_clock_base?;
        Some(base + self.elapsed_millis())
    }

    fn link_up(&self) -> bool {
        self.lock().link_up
    }

    async fn sleep(&self, duration: Duration) {
        if self.follow_runtime {
            tokio::time::sleep(duration).await;
        } else {
            self.advance(duration);
        }
    }
}
