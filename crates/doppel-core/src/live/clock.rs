//! Gapless playback scheduling.
//!
//! Model audio arrives in bursts faster than real time. Each frame is
//! scheduled at `max(now, horizon)` where the horizon is the end of the
//! previously scheduled frame, so playback is contiguous no matter how
//! arrival jitters. A barge-in resets the horizon to zero, which makes
//! the next frame start immediately.

/// Schedules frame start times on the sink's playback clock.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    horizon: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a start time for a frame of `duration` seconds at clock
    /// time `now`. Advances the horizon past the frame.
    pub fn schedule(&mut self, now: f64, duration: f64) -> f64 {
        let start = now.max(self.horizon);
        self.horizon = start + duration;
        start
    }

    /// Discard all scheduled time (barge-in).
    pub fn reset(&mut self) {
        self.horizon = 0.0;
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }
}
