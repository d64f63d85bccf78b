//! JSON shapes of the records the analysis producer emits.
//!
//! Arrays stay variable-length here so a wrong length surfaces as a
//! malformed record naming the offending count instead of a decode error.

use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, VisualizerError};
use crate::features::{
    AnalysisRecord, FeatureChunk, Relationships, FREQUENCY_BANDS, NEUTRAL_TEMPO_BPM, PITCH_CLASSES,
};

fn neutral_flatness() -> f32 {
    0.5
}

fn neutral_tempo() -> f32 {
    NEUTRAL_TEMPO_BPM
}

/// Chunk as it appears in a `chunk_data` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireChunk {
    pub timestamp: f64,
    pub frequencies: Vec<f32>,
    pub amplitude: f32,
    pub brightness: f32,
    pub energy_center: f32,
    pub is_percussive: bool,
    #[serde(default)]
    pub rolloff: f32,
    #[serde(default)]
    pub zero_crossing_rate: f32,
    #[serde(default = "neutral_flatness")]
    pub spectral_flatness: f32,
    pub chroma_features: Vec<f32>,
    #[serde(default)]
    pub beat_strength: f32,
    #[serde(default = "neutral_tempo")]
    pub tempo: f32,
}

impl TryFrom<WireChunk> for FeatureChunk {
    type Error = VisualizerError;

    fn try_from(wire: WireChunk) -> Result<Self, Self::Error> {
        let malformed = |reason| VisualizerError::MalformedRecord {
            timestamp_s: wire.timestamp,
            reason,
        };
        let frequencies: [f32; FREQUENCY_BANDS] =
            wire.frequencies.as_slice().try_into().map_err(|_| {
                malformed(MalformedReason::FrequencyBands {
                    expected: FREQUENCY_BANDS,
                    got: wire.frequencies.len(),
                })
            })?;
        let chroma_features: [f32; PITCH_CLASSES] =
            wire.chroma_features.as_slice().try_into().map_err(|_| {
                malformed(MalformedReason::ChromaBins {
                    expected: PITCH_CLASSES,
                    got: wire.chroma_features.len(),
                })
            })?;

        Ok(FeatureChunk {
            timestamp: wire.timestamp,
            frequencies,
            amplitude: wire.amplitude,
            brightness: wire.brightness,
            energy_center: wire.energy_center,
            is_percussive: wire.is_percussive,
            rolloff: wire.rolloff,
            zero_crossing_rate: wire.zero_crossing_rate,
            spectral_flatness: wire.spectral_flatness,
            chroma_features,
            beat_strength: wire.beat_strength,
            tempo: wire.tempo,
        })
    }
}

impl From<&FeatureChunk> for WireChunk {
    fn from(chunk: &FeatureChunk) -> Self {
        Self {
            timestamp: chunk.timestamp,
            frequencies: chunk.frequencies.to_vec(),
            amplitude: chunk.amplitude,
            brightness: chunk.brightness,
            energy_center: chunk.energy_center,
            is_percussive: chunk.is_percussive,
            rolloff: chunk.rolloff,
            zero_crossing_rate: chunk.zero_crossing_rate,
            spectral_flatness: chunk.spectral_flatness,
            chroma_features: chunk.chroma_features.to_vec(),
            beat_strength: chunk.beat_strength,
            tempo: chunk.tempo,
        }
    }
}

/// Record as it appears in an `analysis_data` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAnalysis {
    pub chunk: WireChunk,
    #[serde(default)]
    pub relationships: Relationships,
}

impl TryFrom<WireAnalysis> for AnalysisRecord {
    type Error = VisualizerError;

    fn try_from(wire: WireAnalysis) -> Result<Self, Self::Error> {
        Ok(AnalysisRecord {
            chunk: FeatureChunk::try_from(wire.chunk)?,
            relationships: wire.relationships,
        })
    }
}

impl From<&AnalysisRecord> for WireAnalysis {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            chunk: WireChunk::from(&record.chunk),
            relationships: record.relationships.clone(),
        }
    }
}
