//! Audio feature records streamed from the analysis producer.

mod relationships;

use serde::{Deserialize, Serialize};

use crate::error::MalformedReason;

pub use relationships::{
    DetectedPattern, EnergyChange, EnergyDirection, Patterns, Predictions, Relationships,
    Transitions, Trends,
};

/// Number of per-band energies in every chunk
pub const FREQUENCY_BANDS: usize = 20;

/// Number of pitch classes in every chroma vector
pub const PITCH_CLASSES: usize = 12;

/// Tempo assumed when no data is available (BPM)
pub const NEUTRAL_TEMPO_BPM: f32 = 120.0;

/// One fixed-interval sample of low-level audio features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureChunk {
    /// Media time of the chunk start (seconds)
    pub timestamp: f64,
    /// Per-band normalized energy (0..1), log-spaced from bass to treble
    pub frequencies: [f32; FREQUENCY_BANDS],
    /// RMS level (0..1)
    pub amplitude: f32,
    /// Normalized spectral centroid (0..1)
    pub brightness: f32,
    /// Frequency where the energy is concentrated (Hz)
    pub energy_center: f32,
    pub is_percussive: bool,
    pub rolloff: f32,
    pub zero_crossing_rate: f32,
    /// 0 = pure tone, 1 = white noise
    pub spectral_flatness: f32,
    /// Per-pitch-class energy, C first
    pub chroma_features: [f32; PITCH_CLASSES],
    /// 0..1
    pub beat_strength: f32,
    /// BPM
    pub tempo: f32,
}

impl FeatureChunk {
    /// The defined "no data" vector: silent, 120 BPM, half-flat spectrum.
    pub fn neutral(timestamp: f64) -> Self {
        Self {
            timestamp,
            frequencies: [0.0; FREQUENCY_BANDS],
            amplitude: 0.0,
            brightness: 0.0,
            energy_center: 0.0,
            is_percussive: false,
            rolloff: 0.0,
            zero_crossing_rate: 0.0,
            spectral_flatness: 0.5,
            chroma_features: [0.0; PITCH_CLASSES],
            beat_strength: 0.0,
            tempo: NEUTRAL_TEMPO_BPM,
        }
    }

    /// Check every numeric field is finite
    pub fn validate(&self) -> Result<(), MalformedReason> {
        let scalars = [
            ("amplitude", self.amplitude),
            ("brightness", self.brightness),
            ("energy_center", self.energy_center),
            ("rolloff", self.rolloff),
            ("zero_crossing_rate", self.zero_crossing_rate),
            ("spectral_flatness", self.spectral_flatness),
            ("beat_strength", self.beat_strength),
            ("tempo", self.tempo),
        ];
        if !self.timestamp.is_finite() {
            return Err(MalformedReason::NonFinite("timestamp"));
        }
        if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MalformedReason::NonFinite(name));
        }
        if self.frequencies.iter().any(|v| !v.is_finite()) {
            return Err(MalformedReason::NonFinite("frequencies"));
        }
        if self.chroma_features.iter().any(|v| !v.is_finite()) {
            return Err(MalformedReason::NonFinite("chroma_features"));
        }
        Ok(())
    }

    /// Strongest pitch class and its energy (index 0 when all bins are equal)
    pub fn dominant_chroma(&self) -> (usize, f32) {
        self.chroma_features
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best })
    }

    /// Band energy, zero for out-of-range bands
    pub fn band(&self, band: usize) -> f32 {
        self.frequencies.get(band).copied().unwrap_or(0.0)
    }
}

/// Coarse-interval sample bundling a chunk with derived relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Chunk at the window's nominal analysis timestamp
    pub chunk: FeatureChunk,
    #[serde(default)]
    pub relationships: Relationships,
}

impl AnalysisRecord {
    pub fn timestamp(&self) -> f64 {
        self.chunk.timestamp
    }
}
