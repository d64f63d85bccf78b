//! Playback synchronization: continuous media time → smooth feature vector.
//!
//! This is the only stage that looks at the media clock. Everything
//! downstream is a function of the sampled vector and the frame delta.

mod clock;
mod interpolate;

pub use clock::{MediaClock, SteppedClock, WallClock};
pub use interpolate::interpolate;

use crate::error::{Result, VisualizerError};
use crate::features::{AnalysisRecord, FeatureChunk};
use crate::timeline::{FeatureTimeline, GRID_EPSILON};

/// Bridges the media clock against the discretely sampled timeline
#[derive(Debug, Clone, Default)]
pub struct PlaybackSynchronizer {
    last_time_s: Option<f64>,
    seek_pending: bool,
}

impl PlaybackSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the media time for this frame
    ///
    /// Backward motion after [`seek`](Self::seek) is expected; otherwise it
    /// is reported as `ClockRegression`. Either way the new time is adopted
    /// and sampling continues from it.
    pub fn observe(&mut self, time_s: f64) -> Result<()> {
        let previous = self.last_time_s.replace(time_s);
        let explicit_seek = std::mem::take(&mut self.seek_pending);
        match previous {
            Some(previous_s) if time_s < previous_s && !explicit_seek => {
                Err(VisualizerError::ClockRegression {
                    previous_s,
                    current_s: time_s,
                })
            }
            _ => Ok(()),
        }
    }

    /// Announce a user seek so the next backward jump is not flagged
    pub fn seek(&mut self) {
        self.seek_pending = true;
    }

    /// Forget clock history (new session)
    pub fn reset(&mut self) {
        self.last_time_s = None;
        self.seek_pending = false;
    }

    pub fn last_time_s(&self) -> Option<f64> {
        self.last_time_s
    }

    /// Interpolated feature vector at media time `time_s`
    ///
    /// Never fails: with the later chunk missing the earlier one is returned
    /// as-is, and with no chunk covering `time_s` the neutral chunk is
    /// returned.
    ///
    /// # Arguments
    /// * `timeline` - Records ingested so far
    /// * `time_s` - Media time in seconds
    ///
    /// # Returns
    /// Feature vector blended between the chunks around `time_s`
    pub fn sample(&self, timeline: &FeatureTimeline, time_s: f64) -> FeatureChunk {
        let interval_s = timeline.chunk_interval_s();

        let Some(earlier) = timeline.chunk_at(time_s) else {
            return FeatureChunk::neutral(if time_s.is_finite() { time_s } else { 0.0 });
        };
        let Some(later) = timeline.chunk_at(time_s + interval_s) else {
            return earlier.clone();
        };

        // Same epsilon as the slot lookup so progress restarts exactly at each grid time
        let position = time_s / interval_s + GRID_EPSILON;
        let progress = (position - position.floor()) as f32;
        interpolate(earlier, later, progress)
    }

    /// Coarse analysis record covering `time_s`, without interpolation
    pub fn sample_analysis<'a>(
        &self,
        timeline: &'a FeatureTimeline,
        time_s: f64,
    ) -> Option<&'a AnalysisRecord> {
        timeline.analysis_at(time_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::chunk;
    use crate::params::TimelineConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn timeline(amplitudes: &[f32]) -> FeatureTimeline {
        let mut timeline = FeatureTimeline::new(&TimelineConfig::default());
        for (k, amp) in amplitudes.iter().enumerate() {
            timeline.append_chunk(chunk(k as f64 * 0.2, *amp)).unwrap();
        }
        timeline
    }

    #[test]
    fn test_midpoint_and_quarter_interpolation() {
        let timeline = timeline(&[0.0, 1.0, 0.0]);
        let sync = PlaybackSynchronizer::new();

        assert!((sync.sample(&timeline, 0.1).amplitude - 0.5).abs() < 1e-6);
        assert!((sync.sample(&timeline, 0.05).amplitude - 0.25).abs() < 1e-6);
        assert!((sync.sample(&timeline, 0.3).amplitude - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_last_chunk_returned_unmodified() {
        let timeline = timeline(&[0.0, 1.0, 0.4]);
        let sync = PlaybackSynchronizer::new();
        let sampled = sync.sample(&timeline, 0.5);
        assert_eq!(&sampled, timeline.chunk_at(0.4).unwrap());
    }

    #[test]
    fn test_empty_timeline_yields_neutral() {
        let timeline = timeline(&[]);
        let sync = PlaybackSynchronizer::new();
        for t in [0.0, 0.37, 12.0, -1.0] {
            let sampled = sync.sample(&timeline, t);
            assert_eq!(sampled.amplitude, 0.0);
            assert_eq!(sampled.tempo, 120.0);
            assert_eq!(sampled.spectral_flatness, 0.5);
            assert!(sampled.frequencies.iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn test_sample_is_idempotent() {
        let timeline = timeline(&[0.1, 0.7, 0.3, 0.9]);
        let sync = PlaybackSynchronizer::new();
        assert_eq!(sync.sample(&timeline, 0.33), sync.sample(&timeline, 0.33));
    }

    #[test]
    fn test_interpolation_stays_within_neighbours() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut timeline = FeatureTimeline::new(&TimelineConfig::default());
        for k in 0..20 {
            let mut c = chunk(k as f64 * 0.2, rng.gen());
            c.brightness = rng.gen();
            c.tempo = rng.gen_range(60.0..180.0);
            c.energy_center = rng.gen_range(100.0..12_000.0);
            for v in c.chroma_features.iter_mut() {
                *v = rng.gen();
            }
            c.is_percussive = rng.gen_bool(0.5);
            timeline.append_chunk(c).unwrap();
        }
        let sync = PlaybackSynchronizer::new();

        for _ in 0..500 {
            let t: f64 = rng.gen_range(0.0..3.8);
            let k = (t / 0.2 + 1e-9).floor();
            let a = timeline.chunk_at(k * 0.2).unwrap();
            let b = timeline.chunk_at((k + 1.0) * 0.2).unwrap();
            let s = sync.sample(&timeline, t);

            let within = |v: f32, x: f32, y: f32| v >= x.min(y) && v <= x.max(y);
            assert!(within(s.amplitude, a.amplitude, b.amplitude));
            assert!(within(s.brightness, a.brightness, b.brightness));
            assert!(within(s.tempo, a.tempo, b.tempo));
            assert!(within(s.energy_center, a.energy_center, b.energy_center));
            for i in 0..12 {
                assert!(within(
                    s.chroma_features[i],
                    a.chroma_features[i],
                    b.chroma_features[i]
                ));
            }

            let progress = (t - k * 0.2) / 0.2;
            let expected = if progress < 0.5 {
                a.is_percussive
            } else {
                b.is_percussive
            };
            // Skip draws sitting on the switch point where rounding decides
            if (progress - 0.5).abs() > 1e-6 {
                assert_eq!(s.is_percussive, expected, "t = {}", t);
            }
        }
    }

    #[test]
    fn test_regression_flagged_without_seek() {
        let mut sync = PlaybackSynchronizer::new();
        assert!(sync.observe(1.0).is_ok());
        assert!(sync.observe(1.5).is_ok());
        assert!(matches!(
            sync.observe(0.5),
            Err(VisualizerError::ClockRegression { .. })
        ));
        // New position is adopted
        assert_eq!(sync.last_time_s(), Some(0.5));
        assert!(sync.observe(0.6).is_ok());
    }

    #[test]
    fn test_seek_allows_backward_jump_once() {
        let mut sync = PlaybackSynchronizer::new();
        sync.observe(5.0).unwrap();
        sync.seek();
        assert!(sync.observe(1.0).is_ok());
        assert!(sync.observe(0.5).is_err());
    }

    #[test]
    fn test_paused_clock_is_not_regression() {
        let mut sync = PlaybackSynchronizer::new();
        sync.observe(2.0).unwrap();
        assert!(sync.observe(2.0).is_ok());
    }
}
