//! Environment abstraction for deterministic testing.
//!
//! Decouples board logic from the host: the monotonic clock that drives
//! timers, the trusted wall clock used to compare against feed timestamps,
//! and network link detection. Production uses the system clock; tests use a
//! virtual clock with a settable wall time and link state.

use std::{
    fmt::Debug,
    future::Future,
    ops::{Add, Sub},
    time::Duration,
};

/// Monotonic instant usable by the timers in this crate.
///
/// Implemented for any type with the arithmetic of `std::time::Instant`, so
/// both `std::time::Instant` and `tokio::time::Instant` qualify.
pub trait MonotonicInstant:
    Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> MonotonicInstant for T where
    T: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = T>
{
}

/// Abstract host environment.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context
/// - `wall_clock_millis()` returns `None` until the host trusts its clock
///   (e.g. before time sync); callers must not guess a time in that case
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type used by this environment.
    type Instant: MonotonicInstant;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Trusted wall-clock time in unix milliseconds, if synced.
    fn wall_clock_millis(&self) -> Option<i64>;

    /// Whether the network link is up.
    fn link_up(&self) -> bool;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; board logic never sleeps.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Trusted wall-clock time in unix seconds, if synced.
    fn wall_clock(&self) -> Option<i64> {
        self.wall_clock_millis().map(|ms| ms.div_euclid(1000))
    }
}
