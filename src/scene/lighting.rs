//! Key light and global scene transform.

use std::f32::consts::TAU;

use crate::mapping::Hsl;
use crate::params::LightingParams;

/// Key light handed to the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub intensity: f32,
    pub color: Hsl,
    /// Light height above the origin (meters)
    pub height_m: f32,
}

/// Whole-scene rotation and breathing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    /// Rotation about the vertical axis (radians, 0..2π)
    pub rotation_rad: f32,
    /// Uniform scale oscillating around 1
    pub breathing_scale: f32,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            rotation_rad: 0.0,
            breathing_scale: 1.0,
        }
    }
}

/// Eased key light plus the tempo-driven transform
#[derive(Debug, Clone)]
pub struct LightRig {
    params: LightingParams,
    light: LightState,
    transform: SceneTransform,
    elapsed_s: f64,
}

impl LightRig {
    pub fn new(params: LightingParams) -> Self {
        Self {
            light: LightState {
                intensity: params.base_intensity,
                color: Hsl::new(params.warm_hue, 0.6, 0.55),
                height_m: 0.0,
            },
            transform: SceneTransform::default(),
            elapsed_s: 0.0,
            params,
        }
    }

    /// Target intensity for an amplitude, dimmed as a break becomes likely
    pub fn target_intensity(&self, amplitude: f32, break_probability: f32) -> f32 {
        (self.params.base_intensity + amplitude.clamp(0.0, 1.0) * self.params.amplitude_intensity)
            * (1.0 - break_probability.clamp(0.0, 1.0) * self.params.break_dimming)
    }

    pub fn advance(
        &mut self,
        dt: f32,
        amplitude: f32,
        brightness: f32,
        break_probability: f32,
        tempo_ratio: f32,
        focus_height_m: f32,
    ) {
        let p = &self.params;
        let ease = (dt * p.easing_rate_per_s).min(1.0);

        let intensity = self.target_intensity(amplitude, break_probability);
        let brightness = brightness.clamp(0.0, 1.0);
        let hue = p.warm_hue + (p.cool_hue - p.warm_hue) * brightness;
        let color = Hsl::new(hue, 0.6, 0.55);

        self.light.intensity += (intensity - self.light.intensity) * ease;
        self.light.color = self.light.color.ease_toward(color, ease);
        self.light.height_m += (focus_height_m - self.light.height_m) * ease;

        self.elapsed_s += dt as f64;
        self.transform.rotation_rad = (self.transform.rotation_rad
            + dt * p.rotation_speed_rad_per_s * tempo_ratio)
            .rem_euclid(TAU);
        // Breathing ignores the audio entirely
        let phase = (self.elapsed_s * p.breathing_frequency_hz as f64).fract() as f32;
        self.transform.breathing_scale = 1.0 + p.breathing_amplitude * (phase * TAU).sin();
    }

    pub fn light(&self) -> LightState {
        self.light
    }

    pub fn transform(&self) -> SceneTransform {
        self.transform
    }
}
