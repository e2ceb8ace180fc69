#![forbid(unsafe_code)]

//! Monotonic host clocks.
//!
//! The tour runtime never reads wall time itself: every deadline is expressed
//! as a [`Duration`] since an unspecified epoch and the host feeds "now" in
//! explicitly. Tests and replay use [`DeterministicClock`]; live hosts use
//! [`SystemClock`], which is backed by `web-time` so it also works on
//! `wasm32-unknown-unknown` (`performance.now()`).

use core::time::Duration;

/// Monotonic clock abstraction.
pub trait Clock {
    /// Returns elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Real monotonic clock anchored at construction time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: web_time::Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}
