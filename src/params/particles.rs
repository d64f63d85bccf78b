//! Particle simulation physics and per-layer profiles.

use serde::{Deserialize, Serialize};

/// Visual and physical character of one particle layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    /// Share of the total particle count (0..1)
    pub share: f32,

    /// Inclusive frequency band range this layer samples
    pub bands: (usize, usize),

    /// Vertical offset added to the mapped band height (meters)
    pub height_offset_m: f32,

    /// Multiplier on the mapped orbit radius
    pub spatial_scale: f32,

    /// Multiplier on forces and anchor attraction
    pub mobility: f32,

    /// Resting particle size (world units)
    pub base_size: f32,

    /// Resting opacity (0..1)
    pub base_opacity: f32,

    /// How strongly the band's pitch class brightens the particle
    pub harmonic_sensitivity: f32,

    /// Additive hue bias (negative = warmer)
    pub hue_bias: f32,

    /// Multiplier on mapped saturation
    pub saturation_scale: f32,
}

impl LayerProfile {
    /// Large, slow, warm particles riding the low bands
    pub fn foundation() -> Self {
        Self {
            share: 0.4,
            bands: (0, 7),
            height_offset_m: -2.0,
            spatial_scale: 0.8,
            mobility: 0.6,
            base_size: 0.35,
            base_opacity: 0.9,
            harmonic_sensitivity: 0.4,
            hue_bias: -0.04,
            saturation_scale: 1.0,
        }
    }

    /// Mid-band particles carrying most of the harmonic colour
    pub fn harmony() -> Self {
        Self {
            share: 0.4,
            bands: (6, 14),
            height_offset_m: 0.0,
            spatial_scale: 1.0,
            mobility: 1.0,
            base_size: 0.25,
            base_opacity: 0.75,
            harmonic_sensitivity: 1.0,
            hue_bias: 0.0,
            saturation_scale: 1.0,
        }
    }

    /// Small, fast, cool particles in the high bands
    pub fn atmosphere() -> Self {
        Self {
            share: 0.2,
            bands: (12, 19),
            height_offset_m: 2.5,
            spatial_scale: 1.25,
            mobility: 1.6,
            base_size: 0.15,
            base_opacity: 0.55,
            harmonic_sensitivity: 0.6,
            hue_bias: 0.06,
            saturation_scale: 0.85,
        }
    }

    /// Number of bands in this layer's range
    pub fn band_span(&self) -> usize {
        self.bands.1 - self.bands.0 + 1
    }
}

/// Particle simulation physics parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Total particle count, fixed for a session
    pub total_count: usize,

    /// Layer profiles in order: foundation, harmony, atmosphere
    pub layers: [LayerProfile; 3],

    /// Half extents of the bounding box centred on the origin (meters)
    pub bounds_half_extent_m: [f32; 3],

    /// Velocity retained on the reflected axis after a wall hit (0..1)
    pub bounce_damping: f32,

    /// Velocity multiplier applied once per frame
    pub velocity_damping: f32,

    /// Easing rate for size, colour and opacity (1/s)
    pub easing_rate_per_s: f32,

    /// Spring strength pulling particles to their mapped anchor (1/s²)
    pub anchor_attraction: f32,

    /// Vertical acceleration from band energy (m/s² at full energy)
    pub band_lift: f32,

    /// Speed of a percussive impulse (m/s)
    pub percussive_impulse_m_per_s: f32,

    /// Amplitude of the continuous noise jitter (m/s²)
    pub jitter_strength: f32,

    /// Temporal frequency of the jitter noise field (Hz)
    pub jitter_frequency_hz: f32,

    /// Largest frame delta accepted; longer frames are clamped (seconds)
    pub max_frame_dt_s: f32,

    /// Seed for spawn positions, jitter phases and impulses
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            total_count: 300,
            layers: [
                LayerProfile::foundation(),
                LayerProfile::harmony(),
                LayerProfile::atmosphere(),
            ],
            bounds_half_extent_m: [18.0, 12.0, 18.0],
            bounce_damping: 0.75,
            velocity_damping: 0.98,
            easing_rate_per_s: 4.0,
            anchor_attraction: 1.5,
            band_lift: 2.0,
            percussive_impulse_m_per_s: 3.0,
            jitter_strength: 0.3,
            jitter_frequency_hz: 0.5,
            max_frame_dt_s: 0.1,
            seed: 42,
        }
    }
}
