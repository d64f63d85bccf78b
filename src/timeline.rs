//! Append-only feature timeline with O(1) time lookup.
//!
//! The producer emits chunks and analysis records on strict, uniform
//! cadences, so every record is stored at its grid slot
//! `round(timestamp / interval)` and the record covering media time `t`
//! lives at slot `⌊t / interval⌋`. No search is ever needed. A record that
//! never arrived leaves a hole: lookups there report a gap while the
//! records after it stay addressable.

use crate::error::{MalformedReason, Result, VisualizerError};
use crate::features::{AnalysisRecord, FeatureChunk};
use crate::params::TimelineConfig;

/// Absorbs float error so exact grid times never floor into the previous slot
pub(crate) const GRID_EPSILON: f64 = 1e-9;

/// Furthest a timestamp may sit from its nominal grid time (fraction of an interval)
const GRID_TOLERANCE: f64 = 0.25;

/// Most slots one sequence will hold (bounds memory for a bogus timestamp)
const MAX_SLOTS: usize = 1 << 22;

/// Fixed-cadence, append-only sequence of records keyed by grid slot
#[derive(Debug, Clone)]
struct FixedGrid<T> {
    interval_s: f64,
    slots: Vec<Option<T>>,
    filled: usize,
}

impl<T> FixedGrid<T> {
    fn new(interval_s: f64) -> Self {
        Self {
            interval_s,
            slots: Vec::new(),
            filled: 0,
        }
    }

    /// Store `record` at the slot its timestamp names
    ///
    /// Slots skipped over stay empty. A record for a filled or earlier slot,
    /// or one too far off its grid time, is rejected and nothing changes.
    fn push(&mut self, timestamp_s: f64, record: T) -> Result<()> {
        let malformed = |reason| VisualizerError::MalformedRecord {
            timestamp_s,
            reason,
        };

        let limit_s = MAX_SLOTS as f64 * self.interval_s;
        if !(timestamp_s >= -self.interval_s * GRID_TOLERANCE) {
            return Err(malformed(MalformedReason::OffGrid { nominal_s: 0.0 }));
        }
        if timestamp_s >= limit_s {
            return Err(malformed(MalformedReason::BeyondHorizon { limit_s }));
        }

        let slot = (timestamp_s / self.interval_s).round().max(0.0) as usize;
        let nominal_s = slot as f64 * self.interval_s;
        if (timestamp_s - nominal_s).abs() > self.interval_s * GRID_TOLERANCE {
            return Err(malformed(MalformedReason::OffGrid { nominal_s }));
        }

        match slot.checked_sub(self.slots.len()) {
            Some(skipped) => {
                if skipped > 0 {
                    log::debug!("{} slot(s) missing before {:.3}s", skipped, nominal_s);
                }
                self.slots.resize_with(slot, || None);
                self.slots.push(Some(record));
                self.filled += 1;
                Ok(())
            }
            None if slot + 1 == self.slots.len() => {
                Err(malformed(MalformedReason::Duplicate { slot_s: nominal_s }))
            }
            None => Err(malformed(MalformedReason::OutOfOrder {
                previous_s: (self.slots.len() - 1) as f64 * self.interval_s,
                got_s: timestamp_s,
            })),
        }
    }

    /// Slot covering `time_s`, or `None` for negative/non-finite time
    fn slot(&self, time_s: f64) -> Option<usize> {
        if !time_s.is_finite() || time_s < 0.0 {
            return None;
        }
        Some((time_s / self.interval_s + GRID_EPSILON).floor() as usize)
    }

    fn get(&self, time_s: f64) -> Option<&T> {
        let index = self.slot(time_s)?;
        let record = self.slots.get(index).and_then(Option::as_ref);
        if record.is_none() {
            log::debug!("{}", VisualizerError::GapInTimeline { time_s, index });
        }
        record
    }

    /// End of the media time covered by the last stored slot (seconds)
    fn covered_until_s(&self) -> f64 {
        self.slots.len() as f64 * self.interval_s
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.filled = 0;
    }
}

/// Feature timeline for one playback session
#[derive(Debug, Clone)]
pub struct FeatureTimeline {
    chunks: FixedGrid<FeatureChunk>,
    analyses: FixedGrid<AnalysisRecord>,
}

impl FeatureTimeline {
    /// Create an empty timeline with the producer's cadences
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            chunks: FixedGrid::new(config.chunk_interval_s),
            analyses: FixedGrid::new(config.analysis_interval_s),
        }
    }

    /// Append a fine-grained chunk
    ///
    /// Rejected chunks leave the timeline unchanged.
    pub fn append_chunk(&mut self, chunk: FeatureChunk) -> Result<()> {
        chunk
            .validate()
            .map_err(|reason| VisualizerError::MalformedRecord {
                timestamp_s: chunk.timestamp,
                reason,
            })?;
        self.chunks.push(chunk.timestamp, chunk)
    }

    /// Append a coarse analysis record
    pub fn append_analysis(&mut self, record: AnalysisRecord) -> Result<()> {
        record
            .chunk
            .validate()
            .map_err(|reason| VisualizerError::MalformedRecord {
                timestamp_s: record.timestamp(),
                reason,
            })?;
        self.analyses.push(record.timestamp(), record)
    }

    /// Chunk covering media time `time_s`
    pub fn chunk_at(&self, time_s: f64) -> Option<&FeatureChunk> {
        self.chunks.get(time_s)
    }

    /// Analysis record covering media time `time_s`
    pub fn analysis_at(&self, time_s: f64) -> Option<&AnalysisRecord> {
        self.analyses.get(time_s)
    }

    /// Drop everything ingested so far
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.analyses.clear();
    }

    pub fn chunk_interval_s(&self) -> f64 {
        self.chunks.interval_s
    }

    pub fn analysis_interval_s(&self) -> f64 {
        self.analyses.interval_s
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.filled
    }

    pub fn analysis_count(&self) -> usize {
        self.analyses.filled
    }

    /// End of the media time covered by ingested chunks (seconds)
    pub fn ingested_until_s(&self) -> f64 {
        self.chunks.covered_until_s()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::chunk;
    use crate::features::Relationships;

    fn timeline_with(n: usize) -> FeatureTimeline {
        let config = TimelineConfig::default();
        let mut timeline = FeatureTimeline::new(&config);
        for k in 0..n {
            let t = k as f64 * config.chunk_interval_s;
            timeline.append_chunk(chunk(t, k as f32 / n as f32)).unwrap();
        }
        timeline
    }

    #[test]
    fn test_exact_grid_times_hit_their_slot() {
        let timeline = timeline_with(50);
        for k in 0..50 {
            let t = k as f64 * 0.2;
            let found = timeline.chunk_at(t).expect("chunk should be present");
            assert_eq!(found.timestamp, t, "slot {} returned wrong chunk", k);
        }
    }

    #[test]
    fn test_lookup_within_interval() {
        let timeline = timeline_with(3);
        assert_eq!(timeline.chunk_at(0.19).unwrap().timestamp, 0.0);
        assert_eq!(timeline.chunk_at(0.21).unwrap().timestamp, 0.2);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let timeline = timeline_with(3);
        assert!(timeline.chunk_at(0.6).is_none());
        assert!(timeline.chunk_at(-0.1).is_none());
        assert!(timeline.chunk_at(f64::NAN).is_none());
    }

    #[test]
    fn test_gap_is_not_resolved_to_neighbour() {
        let config = TimelineConfig::default();
        let mut timeline = FeatureTimeline::new(&config);
        timeline.append_chunk(chunk(0.0, 0.1)).unwrap();
        // 0.2 was dropped upstream
        timeline.append_chunk(chunk(0.4, 0.3)).unwrap();
        timeline.append_chunk(chunk(0.6, 0.4)).unwrap();

        assert!(timeline.chunk_at(0.2).is_none());
        assert!(timeline.chunk_at(0.3).is_none());
        assert_eq!(timeline.chunk_at(0.4).unwrap().timestamp, 0.4);
        assert_eq!(timeline.chunk_at(0.65).unwrap().timestamp, 0.6);
        assert_eq!(timeline.chunk_count(), 3);
        assert!((timeline.ingested_until_s() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_chunk_leaves_later_chunks_addressable() {
        let config = TimelineConfig::default();
        let mut timeline = FeatureTimeline::new(&config);
        for k in 0..50 {
            let mut c = chunk(k as f64 * config.chunk_interval_s, 0.8);
            if k == 2 {
                c.amplitude = f32::NAN;
                assert!(timeline.append_chunk(c).is_err());
            } else {
                timeline.append_chunk(c).unwrap();
            }
        }

        assert_eq!(timeline.chunk_count(), 49);
        assert!(timeline.chunk_at(0.4).is_none());
        for k in 3..50 {
            let t = k as f64 * 0.2;
            let found = timeline.chunk_at(t + 0.05).expect("later chunk should be present");
            assert_eq!(found.timestamp, t);
        }
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let mut timeline = timeline_with(3);
        let err = timeline.append_chunk(chunk(0.4, 0.9)).unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::MalformedRecord {
                reason: MalformedReason::Duplicate { .. },
                ..
            }
        ));
        assert_eq!(timeline.chunk_count(), 3);
        assert_eq!(timeline.chunk_at(0.4).unwrap().amplitude, 2.0 / 3.0);
    }

    #[test]
    fn test_off_grid_record_rejected() {
        let config = TimelineConfig::default();
        let mut timeline = FeatureTimeline::new(&config);
        assert!(timeline.append_chunk(chunk(0.1, 0.5)).is_err());

        let err = timeline
            .append_analysis(AnalysisRecord {
                chunk: chunk(0.6, 0.5),
                relationships: Relationships::default(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::MalformedRecord {
                reason: MalformedReason::OffGrid { .. },
                ..
            }
        ));
        assert_eq!(timeline.analysis_count(), 0);

        // Small producer jitter still lands on its slot
        timeline.append_chunk(chunk(0.21, 0.5)).unwrap();
        assert_eq!(timeline.chunk_at(0.2).unwrap().timestamp, 0.21);
    }

    #[test]
    fn test_far_future_timestamp_rejected() {
        let mut timeline = timeline_with(1);
        let err = timeline.append_chunk(chunk(1.0e9, 0.5)).unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::MalformedRecord {
                reason: MalformedReason::BeyondHorizon { .. },
                ..
            }
        ));
        assert!((timeline.ingested_until_s() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut timeline = timeline_with(3);
        let err = timeline.append_chunk(chunk(0.2, 0.5)).unwrap_err();
        assert!(matches!(
            err,
            VisualizerError::MalformedRecord {
                reason: MalformedReason::OutOfOrder { .. },
                ..
            }
        ));
        assert_eq!(timeline.chunk_count(), 3);
    }

    #[test]
    fn test_non_finite_chunk_rejected() {
        let mut timeline = timeline_with(1);
        let mut bad = chunk(0.2, 0.5);
        bad.amplitude = f32::NAN;
        assert!(timeline.append_chunk(bad).is_err());
        assert_eq!(timeline.chunk_count(), 1);
    }

    #[test]
    fn test_analysis_uses_coarse_grid() {
        let config = TimelineConfig::default();
        let mut timeline = FeatureTimeline::new(&config);
        for k in 0..3 {
            timeline
                .append_analysis(AnalysisRecord {
                    chunk: chunk(k as f64, 0.5),
                    relationships: Relationships::default(),
                })
                .unwrap();
        }
        assert_eq!(timeline.analysis_at(1.7).unwrap().timestamp(), 1.0);
        assert_eq!(timeline.analysis_at(2.0).unwrap().timestamp(), 2.0);
        assert!(timeline.analysis_at(3.0).is_none());
    }

    #[test]
    fn test_reset_clears_both_sequences() {
        let mut timeline = timeline_with(5);
        timeline
            .append_analysis(AnalysisRecord {
                chunk: chunk(0.0, 0.5),
                relationships: Relationships::default(),
            })
            .unwrap();
        timeline.reset();
        assert_eq!(timeline.chunk_count(), 0);
        assert_eq!(timeline.analysis_count(), 0);
        assert!(timeline.chunk_at(0.0).is_none());
        // Ordering restarts with the new session
        assert!(timeline.append_chunk(chunk(0.0, 0.1)).is_ok());
    }

    #[test]
    fn test_ingested_until() {
        let timeline = timeline_with(10);
        assert!((timeline.ingested_until_s() - 2.0).abs() < 1e-9);
    }
}
