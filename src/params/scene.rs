//! Camera, lighting and global scene response parameters.

use serde::{Deserialize, Serialize};

/// Orbiting camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRig {
    /// Resting orbit radius (meters)
    pub base_radius_m: f32,

    /// Resting camera height (meters)
    pub base_height_m: f32,

    /// Orbit angular speed (radians per second)
    pub orbit_speed_rad_per_s: f32,

    /// Radius gain at full beat strength (meters)
    pub beat_radius_m: f32,

    /// Height gain at full beat strength (meters)
    pub beat_height_m: f32,

    /// Radius change per unit of overall energy trend (meters, rising energy pulls in)
    pub trend_radius_m: f32,

    /// Height change per unit of overall energy trend (meters)
    pub trend_height_m: f32,

    /// Extra height at full buildup probability (meters)
    pub buildup_height_m: f32,

    /// Fraction of the energy-centre height the look-at target follows
    pub look_at_height_fraction: f32,

    /// Resting vertical field of view (degrees)
    pub base_fov_degrees: f32,

    /// Field of view gain at full amplitude (degrees)
    pub amplitude_fov_degrees: f32,

    /// Field of view gain at certain drop (degrees)
    pub drop_fov_degrees: f32,

    /// Easing rate toward freshly computed camera targets (1/s)
    pub easing_rate_per_s: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            base_radius_m: 25.0,
            base_height_m: 6.0,
            orbit_speed_rad_per_s: 0.1,
            beat_radius_m: 3.0,
            beat_height_m: 2.0,
            trend_radius_m: 4.0,
            trend_height_m: 3.0,
            buildup_height_m: 2.5,
            look_at_height_fraction: 0.5,
            base_fov_degrees: 60.0,
            amplitude_fov_degrees: 8.0,
            drop_fov_degrees: 15.0,
            easing_rate_per_s: 2.0,
        }
    }
}

/// Key light and global transform parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    /// Light intensity with silent audio
    pub base_intensity: f32,

    /// Intensity gain at full amplitude
    pub amplitude_intensity: f32,

    /// Fraction of intensity removed at certain break
    pub break_dimming: f32,

    /// Light hue for the darkest sounds (0..1, warm)
    pub warm_hue: f32,

    /// Light hue for the brightest sounds (0..1, cool)
    pub cool_hue: f32,

    /// Scene rotation speed at 120 BPM (radians per second)
    pub rotation_speed_rad_per_s: f32,

    /// Breathing scale oscillation frequency (Hz)
    pub breathing_frequency_hz: f32,

    /// Breathing scale amplitude (fraction of unit scale)
    pub breathing_amplitude: f32,

    /// Easing rate toward light targets (1/s)
    pub easing_rate_per_s: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            base_intensity: 0.6,
            amplitude_intensity: 1.4,
            break_dimming: 0.4,
            warm_hue: 0.08,
            cool_hue: 0.6,
            rotation_speed_rad_per_s: 0.15,
            breathing_frequency_hz: 0.25,
            breathing_amplitude: 0.03,
            easing_rate_per_s: 3.0,
        }
    }
}

/// Everything the scene response controller needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    pub camera: CameraRig,
    pub lighting: LightingParams,
}
