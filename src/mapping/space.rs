//! Frequency → space rules.

use std::f32::consts::TAU;

use crate::features::{FREQUENCY_BANDS, PITCH_CLASSES};

/// Lowest anchor height (band 0, meters)
const FLOOR_HEIGHT_M: f32 = -6.0;

/// Vertical span from band 0 to the top band (meters)
const HEIGHT_SPAN_M: f32 = 14.0;

/// Anchor height for a frequency band
///
/// Follows `(band/19)^1.5` so low bands cluster near the floor and high
/// bands spread out as they climb.
pub fn band_height(band: usize) -> f32 {
    let top = (FREQUENCY_BANDS - 1) as f32;
    let normalized = (band.min(FREQUENCY_BANDS - 1) as f32 / top).powf(1.5);
    FLOOR_HEIGHT_M + normalized * HEIGHT_SPAN_M
}

/// Orbit radius for the whole frame (meters)
pub fn orbit_radius(amplitude: f32, energy_center_hz: f32, ceiling_hz: f32) -> f32 {
    let center = if ceiling_hz > 0.0 {
        (energy_center_hz.max(0.0) / ceiling_hz).min(1.0)
    } else {
        0.0
    };
    3.0 + amplitude.clamp(0.0, 1.0) * 7.0 + center * 3.0
}

/// Rotation of the whole ring set by the dominant pitch class (radians)
pub fn harmonic_shift(dominant_pitch_class: usize) -> f32 {
    (dominant_pitch_class % PITCH_CLASSES) as f32 / PITCH_CLASSES as f32 * TAU
}

/// Angular position of particle `index` of `total` (radians)
///
/// `jitter` is the particle's fixed draw in -0.5..0.5; it only shows when the
/// spectrum is noisy.
pub fn particle_angle(
    index: usize,
    total: usize,
    shift: f32,
    jitter: f32,
    spectral_flatness: f32,
    max_jitter_rad: f32,
) -> f32 {
    let even = index as f32 / total.max(1) as f32 * TAU;
    even + shift + jitter * spectral_flatness.clamp(0.0, 1.0) * max_jitter_rad * 2.0
}
