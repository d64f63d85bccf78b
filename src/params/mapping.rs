//! Synesthetic mapping constants.
//!
//! The perceptual rules themselves are fixed; only the scalars that size
//! their effect are tunable here.

use serde::{Deserialize, Serialize};

/// Scalars for the feature → visual mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingParams {
    /// Chroma bins above this fraction of the strongest bin blend into the hue
    pub chroma_blend_threshold: f32,

    /// Hue shift per unit of brightness away from 0.5
    pub brightness_hue_shift: f32,

    /// Size gain per unit of (band energy × amplitude)
    /// Formula: size = base * (1 + band * amplitude * this_scale)
    pub size_scalar: f32,

    /// Extra size multiplier on strong percussive hits
    pub percussive_size_boost: f32,

    /// Beat strength a percussive chunk must exceed to trigger the boost
    pub percussive_beat_threshold: f32,

    /// Largest angular jitter at full spectral flatness (radians)
    pub max_angle_jitter_rad: f32,

    /// Energy centre that saturates the radius contribution (Hz)
    pub energy_center_ceiling_hz: f32,

    /// Lightness gain from a particle's harmonic resonance
    pub resonance_lightness: f32,
}

impl Default for MappingParams {
    fn default() -> Self {
        Self {
            chroma_blend_threshold: 0.6,
            brightness_hue_shift: 0.2,
            size_scalar: 2.0,
            percussive_size_boost: 1.5,
            percussive_beat_threshold: 0.3,
            max_angle_jitter_rad: 0.6,
            energy_center_ceiling_hz: 20_000.0,
            resonance_lightness: 0.15,
        }
    }
}
