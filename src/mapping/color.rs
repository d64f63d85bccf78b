//! Pitch → colour rules.

use crate::features::{FeatureChunk, PITCH_CLASSES};
use crate::params::MappingParams;

/// Colour in hue/saturation/lightness, each 0..1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Move toward `target` by `t` (0..1); hue travels the shorter way round
    pub fn ease_toward(self, target: Hsl, t: f32) -> Hsl {
        let dh = (target.h - self.h + 0.5).rem_euclid(1.0) - 0.5;
        Hsl {
            h: (self.h + dh * t).rem_euclid(1.0),
            s: self.s + (target.s - self.s) * t,
            l: self.l + (target.l - self.l) * t,
        }
    }

    /// Linear RGB triple (0..1)
    pub fn to_rgb(self) -> [f32; 3] {
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);
        if s == 0.0 {
            return [l, l, l];
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = self.h.rem_euclid(1.0);
        [
            hue_channel(p, q, h + 1.0 / 3.0),
            hue_channel(p, q, h),
            hue_channel(p, q, h - 1.0 / 3.0),
        ]
    }
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Position of a pitch class on the 12-step chromatic hue wheel
pub fn chromatic_hue(pitch_class: usize) -> f32 {
    (pitch_class % PITCH_CLASSES) as f32 / PITCH_CLASSES as f32
}

/// Hue of the dominant pitch class, blended with strong secondary classes
///
/// Bins above `threshold × max` pull the hue toward their own wheel
/// position, weighted by strength relative to the max. Offsets are taken
/// around the circle from the dominant hue, so neighbours across C blend
/// through 0 rather than through the far side of the wheel.
pub fn blended_hue(chroma: &[f32; PITCH_CLASSES], threshold: f32) -> f32 {
    let (dominant, max) = chroma
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let base = chromatic_hue(dominant);
    if !(max > 0.0) {
        return base;
    }

    let mut weight_sum = 1.0;
    let mut offset_sum = 0.0;
    for (i, &value) in chroma.iter().enumerate() {
        if i == dominant || value <= max * threshold {
            continue;
        }
        let weight = value / max;
        let offset = (chromatic_hue(i) - base + 0.5).rem_euclid(1.0) - 0.5;
        weight_sum += weight;
        offset_sum += offset * weight;
    }
    (base + offset_sum / weight_sum).rem_euclid(1.0)
}

/// Frame-wide colour derived from one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub color: Hsl,
    pub dominant_pitch_class: usize,
    pub dominant_strength: f32,
}

/// Apply the hue, saturation and lightness rules to a chunk
pub fn palette(chunk: &FeatureChunk, params: &MappingParams) -> Palette {
    let (dominant_pitch_class, dominant_strength) = chunk.dominant_chroma();
    let dominant_strength = dominant_strength.clamp(0.0, 1.0);

    let hue = blended_hue(&chunk.chroma_features, params.chroma_blend_threshold);
    // Brighter sounds shift cooler
    let hue = (hue + (chunk.brightness - 0.5) * params.brightness_hue_shift).rem_euclid(1.0);

    let saturation = 0.3 + (1.0 - chunk.spectral_flatness.clamp(0.0, 1.0)) * 0.7;
    let lightness =
        (0.4 + chunk.amplitude.clamp(0.0, 1.0) * 0.4 + dominant_strength * 0.2).min(0.9);

    Palette {
        color: Hsl::new(hue, saturation, lightness),
        dominant_pitch_class,
        dominant_strength,
    }
}
