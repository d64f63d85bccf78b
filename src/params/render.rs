//! Viewport and frame-loop configuration.

use serde::{Deserialize, Serialize};

/// Render surface viewport used to build the projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Viewport width (pixels)
    pub width: u32,

    /// Viewport height (pixels)
    pub height: u32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            near_plane_m: 0.1,
            far_plane_m: 500.0,
        }
    }
}

impl ViewportConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Headless playback run configuration
#[derive(Debug, Clone)]
pub struct PlaybackRun {
    /// Media time to play through (seconds)
    pub duration_secs: f32,

    /// Frame rate of the simulated render loop (FPS)
    pub fps: u32,
}

impl PlaybackRun {
    pub fn new(duration_secs: f32, fps: u32) -> Self {
        Self { duration_secs, fps }
    }

    /// Total number of frames to advance
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Fixed frame delta (seconds)
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}
