//! Timeline cadence configuration.

use serde::{Deserialize, Serialize};

/// Fixed emission cadences agreed with the feature producer.
///
/// O(1) lookup in the timeline store relies on these intervals being strict
/// and uniform. Jittered or missing records are reported as gaps, never
/// resolved to a neighbouring record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Interval between fine-grained feature chunks (seconds)
    pub chunk_interval_s: f64,

    /// Interval between coarse analysis records (seconds)
    pub analysis_interval_s: f64,

    /// Capacity of the transport → session message feed (messages)
    pub feed_capacity: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            chunk_interval_s: 0.2,
            analysis_interval_s: 1.0,
            feed_capacity: 4096,
        }
    }
}
