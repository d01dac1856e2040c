//! Phase timing
//!
//! Wall-clock timing on the monotonic clock. Samples are reported in seconds.

use std::time::{Duration, Instant};

/// Stopwatch that splits elapsed time into consecutive laps
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    last: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Seconds since the previous lap (or the start), then begin a new lap
    #[inline(always)]
    pub fn lap(&mut self) -> f64 {
        let now = Instant::now();
        let lap = now.duration_since(self.last);
        self.last = now;
        lap.as_secs_f64()
    }

    /// Total time since the timer started
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
