//! Error types for the visualization core.
//!
//! Nothing here is fatal to the process: ingest errors drop a single record,
//! timeline gaps degrade to the neutral feature vector and clock regressions
//! are logged and sampled through.

use std::fmt;

/// Why an incoming record was rejected at ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedReason {
    /// `frequencies` did not hold exactly the expected number of bands.
    FrequencyBands { expected: usize, got: usize },
    /// `chroma_features` did not hold exactly the expected number of bins.
    ChromaBins { expected: usize, got: usize },
    /// A numeric field was NaN or infinite.
    NonFinite(&'static str),
    /// Timestamp earlier than the last accepted record of the same kind.
    OutOfOrder { previous_s: f64, got_s: f64 },
    /// Another record already occupies this grid slot.
    Duplicate { slot_s: f64 },
    /// Timestamp too far from the nearest grid time to belong to it.
    OffGrid { nominal_s: f64 },
    /// Timestamp lies beyond the furthest grid slot the timeline will hold.
    BeyondHorizon { limit_s: f64 },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::FrequencyBands { expected, got } => {
                write!(f, "expected {} frequency bands, got {}", expected, got)
            }
            MalformedReason::ChromaBins { expected, got } => {
                write!(f, "expected {} chroma bins, got {}", expected, got)
            }
            MalformedReason::NonFinite(field) => write!(f, "field `{}` is not finite", field),
            MalformedReason::OutOfOrder { previous_s, got_s } => write!(
                f,
                "timestamp {:.3}s precedes last accepted {:.3}s",
                got_s, previous_s
            ),
            MalformedReason::Duplicate { slot_s } => {
                write!(f, "grid slot {:.3}s is already filled", slot_s)
            }
            MalformedReason::OffGrid { nominal_s } => {
                write!(f, "timestamp is off its grid time {:.3}s", nominal_s)
            }
            MalformedReason::BeyondHorizon { limit_s } => {
                write!(f, "timestamp beyond timeline horizon {:.0}s", limit_s)
            }
        }
    }
}

/// Errors raised by the visualization core.
#[derive(Debug)]
pub enum VisualizerError {
    /// Record violated a data-model invariant and was dropped.
    MalformedRecord {
        timestamp_s: f64,
        reason: MalformedReason,
    },
    /// Lookup index beyond the ingested range (data not yet available).
    GapInTimeline { time_s: f64, index: usize },
    /// Media time moved backward outside an explicit seek.
    ClockRegression { previous_s: f64, current_s: f64 },
    /// Configuration failed validation.
    InvalidConfig(String),
    /// Wire message could not be decoded.
    Wire(serde_json::Error),
    /// Feed queue is at capacity; the message was not enqueued.
    FeedFull,
    /// Failed to read a file from disk.
    Io(std::io::Error),
}

impl fmt::Display for VisualizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizerError::MalformedRecord {
                timestamp_s,
                reason,
            } => write!(f, "Malformed record at {:.3}s: {}", timestamp_s, reason),
            VisualizerError::GapInTimeline { time_s, index } => write!(
                f,
                "No timeline data at {:.3}s (slot {} not ingested)",
                time_s, index
            ),
            VisualizerError::ClockRegression {
                previous_s,
                current_s,
            } => write!(
                f,
                "Media clock moved backward from {:.3}s to {:.3}s without a seek",
                previous_s, current_s
            ),
            VisualizerError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            VisualizerError::Wire(e) => write!(f, "Failed to decode stream message: {}", e),
            VisualizerError::FeedFull => write!(f, "Feature feed is full"),
            VisualizerError::Io(e) => write!(f, "Failed to read file: {}", e),
        }
    }
}

impl std::error::Error for VisualizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VisualizerError::Wire(e) => Some(e),
            VisualizerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VisualizerError {
    fn from(e: serde_json::Error) -> Self {
        VisualizerError::Wire(e)
    }
}

impl From<std::io::Error> for VisualizerError {
    fn from(e: std::io::Error) -> Self {
        VisualizerError::Io(e)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, VisualizerError>;
