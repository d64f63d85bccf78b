//! Media clock sources.
//!
//! Audio playback lives outside this crate; the clock is the only thing the
//! core sees of it.

use std::time::Instant;

/// Current playback position of the external audio player
pub trait MediaClock {
    /// Playback position (seconds). Non-decreasing while playing, frozen while paused.
    fn position_s(&self) -> f64;

    fn is_playing(&self) -> bool;
}

/// Host-advanced clock for deterministic playback (headless runs, tests)
#[derive(Debug, Clone, Default)]
pub struct SteppedClock {
    position_s: f64,
    playing: bool,
}

impl SteppedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame; no-op while paused
    pub fn advance(&mut self, dt_s: f64) {
        if self.playing && dt_s.is_finite() && dt_s > 0.0 {
            self.position_s += dt_s;
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn seek(&mut self, position_s: f64) {
        self.position_s = position_s.max(0.0);
    }
}

impl MediaClock for SteppedClock {
    fn position_s(&self) -> f64 {
        self.position_s
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Wall-clock driven playback position
#[derive(Debug, Clone, Default)]
pub struct WallClock {
    /// Instant playback (re)started, `None` while paused
    started_at: Option<Instant>,
    /// Position accumulated before the current run
    offset_s: f64,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.offset_s += started.elapsed().as_secs_f64();
        }
    }

    pub fn seek(&mut self, position_s: f64) {
        self.offset_s = position_s.max(0.0);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

impl MediaClock for WallClock {
    fn position_s(&self) -> f64 {
        self.offset_s
            + self
                .started_at
                .map(|s| s.elapsed().as_secs_f64())
                .unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }
}
