//! Synesthetic mapping from audio features to visual targets.
//!
//! Pure functions of the sampled feature vector: the mapper never touches
//! particles, it only produces the targets the simulation eases toward.

mod color;
mod space;

use glam::Vec3;

pub use color::{blended_hue, chromatic_hue, palette, Hsl, Palette};
pub use space::{band_height, harmonic_shift, orbit_radius, particle_angle};

use crate::features::{FeatureChunk, PITCH_CLASSES};
use crate::params::{LayerProfile, MappingParams};

/// Frame-wide mapping results shared by every particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedFrame {
    pub palette: Palette,
    /// Orbit radius before layer scaling (meters)
    pub radius_m: f32,
    /// Ring rotation from the dominant pitch class (radians)
    pub harmonic_shift_rad: f32,
    /// Strong percussive hit this frame
    pub percussive_boost: bool,
}

/// Stable per-particle inputs to the mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSlot {
    /// Position of the particle in the whole set
    pub index: usize,
    /// Size of the whole set
    pub total: usize,
    pub band: usize,
    /// Fixed draw in -0.5..0.5 made at creation
    pub angle_jitter: f32,
}

/// Targets one particle eases toward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleTargets {
    pub position: Vec3,
    pub size: f32,
    pub color: Hsl,
    pub opacity: f32,
    pub harmonic_resonance: f32,
}

/// Deterministic feature → visual rule set
#[derive(Debug, Clone, Default)]
pub struct SynestheticMapper {
    params: MappingParams,
}

impl SynestheticMapper {
    pub fn new(params: MappingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MappingParams {
        &self.params
    }

    /// Map the frame-wide attributes of a feature vector
    pub fn map_frame(&self, chunk: &FeatureChunk) -> MappedFrame {
        let palette = palette(chunk, &self.params);
        MappedFrame {
            palette,
            radius_m: orbit_radius(
                chunk.amplitude,
                chunk.energy_center,
                self.params.energy_center_ceiling_hz,
            ),
            harmonic_shift_rad: harmonic_shift(palette.dominant_pitch_class),
            percussive_boost: chunk.is_percussive
                && chunk.beat_strength > self.params.percussive_beat_threshold,
        }
    }

    /// Size target for a band: `base * (1 + band * amplitude * scalar)`,
    /// boosted on strong percussive hits
    pub fn size_target(
        &self,
        base_size: f32,
        band_energy: f32,
        amplitude: f32,
        boost: bool,
    ) -> f32 {
        let drive = band_energy.clamp(0.0, 1.0) * amplitude.clamp(0.0, 1.0);
        let size = base_size * (1.0 + drive * self.params.size_scalar);
        if boost {
            size * self.params.percussive_size_boost
        } else {
            size
        }
    }

    /// Targets for one particle, with its layer's bias applied
    pub fn map_particle(
        &self,
        frame: &MappedFrame,
        chunk: &FeatureChunk,
        slot: &ParticleSlot,
        layer: &LayerProfile,
    ) -> ParticleTargets {
        let band_energy = chunk.band(slot.band).clamp(0.0, 1.0);

        let angle = particle_angle(
            slot.index,
            slot.total,
            frame.harmonic_shift_rad,
            slot.angle_jitter,
            chunk.spectral_flatness,
            self.params.max_angle_jitter_rad,
        );
        let radius = frame.radius_m * layer.spatial_scale;
        let position = Vec3::new(
            angle.cos() * radius,
            band_height(slot.band) + layer.height_offset_m,
            angle.sin() * radius,
        );

        let resonance = layer.harmonic_sensitivity
            * chunk.chroma_features[slot.band % PITCH_CLASSES].clamp(0.0, 1.0);
        let base = frame.palette.color;
        let color = Hsl::new(
            (base.h + layer.hue_bias).rem_euclid(1.0),
            (base.s * layer.saturation_scale).clamp(0.0, 1.0),
            (base.l + resonance * self.params.resonance_lightness).min(0.9),
        );

        ParticleTargets {
            position,
            size: self.size_target(
                layer.base_size,
                band_energy,
                chunk.amplitude,
                frame.percussive_boost,
            ),
            color,
            opacity: (layer.base_opacity * (0.6 + 0.4 * band_energy)).clamp(0.0, 1.0),
            harmonic_resonance: resonance,
        }
    }
}
