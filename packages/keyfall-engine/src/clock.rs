//! Playback clock
//!
//! A pausable logical clock. Every operation takes the caller's monotonic
//! "now" in milliseconds, so the same clock runs off a UI frame timestamp, an
//! [`Instant`](std::time::Instant) through [`MonotonicTime`], or a simulated
//! timeline in tests and replays.

use std::time::Instant;

/// Milliseconds since this source was created, from [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    base: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.base.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackClock {
    origin: Option<f64>,
    paused_at: Option<f64>,
    paused_total: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the origin. Starting a started clock does nothing.
    pub fn start(&mut self, now: f64) {
        if self.origin.is_none() {
            self.origin = Some(now);
        }
    }

    /// Milliseconds since the origin, minus time spent paused.
    ///
    /// Zero before `start`, and never negative.
    pub fn elapsed(&self, now: f64) -> f64 {
        let Some(origin) = self.origin else {
            return 0.0;
        };
        let effective_now = self.paused_at.unwrap_or(now);
        (effective_now - origin - self.paused_total).max(0.0)
    }

    pub fn pause(&mut self, now: f64) {
        if self.origin.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: f64) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += (now - paused_at).max(0.0);
        }
    }

    /// Clear origin and accumulated pause time.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_started(&self) -> bool {
        self.origin.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.is_started() && !self.is_paused()
    }
}
