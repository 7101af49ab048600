//! Monotonic real-time sources.
//!
//! The duel core never reads the system clock directly; a [`Clock`] is
//! injected at construction. This keeps duel fairness independent of any
//! simulated time scaling (slow motion, pause) the host applies to rendering,
//! and lets tests drive rounds with a manually stepped clock.

use std::sync::Arc;

use parking_lot::Mutex;
use web_time::Instant;

/// A monotonically increasing real-time source, in seconds.
///
/// # Contract
///
/// Successive calls to [`now`](Clock::now) never return a smaller value, and
/// the value is unaffected by simulated time scaling. The duel core trusts
/// this contract rather than re-checking it; see [`RealClock`] for the
/// production implementation.
pub trait Clock {
    /// Returns the current time in seconds. The epoch is arbitrary; only
    /// differences matter.
    fn now(&self) -> f64;
}

/// The production [`Clock`]: seconds elapsed since construction, measured on
/// a monotonic instant.
#[derive(Debug, Clone)]
pub struct RealClock {
    origin: Instant,
}

impl RealClock {
    /// Creates a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RealClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A manually stepped [`Clock`] for tests and lockstep hosts.
///
/// Cloning is cheap and all clones share the same time value, so a test can
/// keep one handle while the orchestrator owns another:
///
/// ```
/// use quickdraw_duel::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// clock.step(0.5);
/// assert_eq!(handle.now(), 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at the given time in seconds.
    #[must_use]
    pub fn at(now: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Advances the clock by `delta` seconds. Negative deltas are ignored;
    /// the clock is monotonic by contract.
    pub fn step(&self, delta: f64) {
        if delta > 0.0 {
            *self.now.lock() += delta;
        }
    }

    /// Sets the clock to `now` seconds if that does not move time backwards.
    pub fn set(&self, now: f64) {
        let mut current = self.now.lock();
        if now > *current {
            *current = now;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}
