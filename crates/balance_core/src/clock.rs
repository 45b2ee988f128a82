//! Wall-clock abstraction for time-boxed sampling and run timeouts.
//!
//! Production code reads `SystemClock`; tests drive budgets with
//! `SteppingClock`, which advances a fixed amount on every read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Artificially slow clock: every read returns the current time and then
/// advances it by `step_us` microseconds.
#[derive(Debug)]
pub struct SteppingClock {
    now_us: AtomicU64,
    step_us: u64,
}

impl SteppingClock {
    pub fn new(step_ms: f64) -> Self {
        Self {
            now_us: AtomicU64::new(0),
            step_us: (step_ms * 1000.0).round().max(0.0) as u64,
        }
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> f64 {
        let us = self.now_us.fetch_add(self.step_us, Ordering::SeqCst);
        us as f64 / 1000.0
    }
}
