//! Tick pacing utilities for fixed-period loops.
//!
//! The motion loop advances one step per tick. Each tick measures how long
//! its own work took and sleeps only for the remainder of the period, so
//! host load stretches individual ticks instead of accumulating drift.

use std::time::{Duration, Instant};

/// Paces a loop at a fixed tick period.
#[derive(Debug, Clone, Copy)]
pub struct TickPacer {
    period: Duration,
}

impl TickPacer {
    /// Create a pacer with the given period. A zero period is raised to 1ms.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Create a pacer from a period in milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left in the tick that started at `tick_start`, as of `now`.
    pub fn remaining_at(&self, tick_start: Instant, now: Instant) -> Duration {
        self.period
            .saturating_sub(now.saturating_duration_since(tick_start))
    }

    /// Sleep for whatever is left of the tick that started at `tick_start`.
    pub fn sleep_remainder(&self, tick_start: Instant) {
        let remaining = self.remaining_at(tick_start, Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

impl Default for TickPacer {
    fn default() -> Self {
        Self::from_millis(10)
    }
}
