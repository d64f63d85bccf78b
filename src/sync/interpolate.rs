//! Chunk-to-chunk interpolation.

use crate::features::FeatureChunk;

/// Linear interpolation kept inside the endpoints despite rounding
fn lerp_bounded(a: f32, b: f32, progress: f32) -> f32 {
    let value = a + (b - a) * progress;
    value.clamp(a.min(b), a.max(b))
}

/// Blend two consecutive chunks at `progress` (0 = `earlier`, 1 = `later`)
///
/// Every numeric field is lerped. `is_percussive` is a hard switch at the
/// midpoint since a hit cannot be half present.
pub fn interpolate(earlier: &FeatureChunk, later: &FeatureChunk, progress: f32) -> FeatureChunk {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let lerp = |a: f32, b: f32| lerp_bounded(a, b, p);

    let mut frequencies = earlier.frequencies;
    for (value, target) in frequencies.iter_mut().zip(later.frequencies.iter()) {
        *value = lerp(*value, *target);
    }

    let mut chroma_features = earlier.chroma_features;
    for (value, target) in chroma_features.iter_mut().zip(later.chroma_features.iter()) {
        *value = lerp(*value, *target);
    }

    let timestamp = earlier.timestamp + (later.timestamp - earlier.timestamp) * p as f64;

    FeatureChunk {
        timestamp,
        frequencies,
        amplitude: lerp(earlier.amplitude, later.amplitude),
        brightness: lerp(earlier.brightness, later.brightness),
        energy_center: lerp(earlier.energy_center, later.energy_center),
        is_percussive: if p < 0.5 {
            earlier.is_percussive
        } else {
            later.is_percussive
        },
        rolloff: lerp(earlier.rolloff, later.rolloff),
        zero_crossing_rate: lerp(earlier.zero_crossing_rate, later.zero_crossing_rate),
        spectral_flatness: lerp(earlier.spectral_flatness, later.spectral_flatness),
        chroma_features,
        beat_strength: lerp(earlier.beat_strength, later.beat_strength),
        tempo: lerp(earlier.tempo, later.tempo),
    }
}
