//! Camera, lighting and global transforms driven by features and trends.

mod camera;
mod lighting;

pub use camera::{target_fov, CameraDrive, CameraState, OrbitCamera};
pub use lighting::{LightRig, LightState, SceneTransform};

use crate::features::{AnalysisRecord, FeatureChunk, NEUTRAL_TEMPO_BPM};
use crate::mapping::band_height;
use crate::params::SceneParams;

/// Scene response system: eased camera, key light and transform
pub struct SceneResponseController {
    camera: OrbitCamera,
    lights: LightRig,
    energy_center_ceiling_hz: f32,
}

impl SceneResponseController {
    pub fn new(params: SceneParams, energy_center_ceiling_hz: f32) -> Self {
        Self {
            camera: OrbitCamera::new(params.camera),
            lights: LightRig::new(params.lighting),
            energy_center_ceiling_hz,
        }
    }

    /// Advance one frame
    ///
    /// `analysis` carries the trend and prediction data; without it the
    /// scene responds to the chunk alone.
    ///
    /// # Arguments
    /// * `dt_s` - Frame delta in seconds
    /// * `chunk` - Interpolated feature vector for this frame
    /// * `analysis` - Coarse analysis record covering the same media time
    pub fn advance(&mut self, dt_s: f32, chunk: &FeatureChunk, analysis: Option<&AnalysisRecord>) {
        let dt = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        let focus_height_m = self.focus_height(chunk.energy_center);

        let (trend, drop, buildup, breakdown) = analysis
            .map(|a| {
                let r = &a.relationships;
                (
                    r.overall_energy_trend(),
                    r.drop_probability(),
                    r.buildup_probability(),
                    r.break_probability(),
                )
            })
            .unwrap_or_default();

        self.camera.advance(
            dt,
            &CameraDrive {
                amplitude: chunk.amplitude.clamp(0.0, 1.0),
                beat_strength: chunk.beat_strength.clamp(0.0, 1.0),
                energy_trend: trend,
                drop_probability: drop,
                buildup_probability: buildup,
                focus_height_m,
            },
        );

        let tempo_ratio = chunk.tempo.clamp(0.0, 300.0) / NEUTRAL_TEMPO_BPM;
        self.lights.advance(
            dt,
            chunk.amplitude,
            chunk.brightness,
            breakdown,
            tempo_ratio,
            focus_height_m,
        );
    }

    /// Height in the particle field matching where the energy sits
    fn focus_height(&self, energy_center_hz: f32) -> f32 {
        if !(self.energy_center_ceiling_hz > 0.0) {
            return band_height(0);
        }
        let top = crate::features::FREQUENCY_BANDS - 1;
        let center = (energy_center_hz.max(0.0) / self.energy_center_ceiling_hz).min(1.0);
        // Interpolate between neighbouring band heights
        let position = center * top as f32;
        let low = position.floor() as usize;
        let high = (low + 1).min(top);
        let t = position - low as f32;
        band_height(low) + (band_height(high) - band_height(low)) * t
    }

    pub fn camera(&self) -> CameraState {
        self.camera.state()
    }

    pub fn light(&self) -> LightState {
        self.lights.light()
    }

    pub fn transform(&self) -> SceneTransform {
        self.lights.transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Relationships;

    fn analysis_with(configure: impl FnOnce(&mut Relationships)) -> AnalysisRecord {
        let mut relationships = Relationships::default();
        configure(&mut relationships);
        AnalysisRecord {
            chunk: FeatureChunk::neutral(0.0),
            relationships,
        }
    }

    #[test]
    fn test_drop_probability_widens_fov() {
        let params = SceneParams::default();
        let base = params.camera.base_fov_degrees;
        let mut scene = SceneResponseController::new(params, 20_000.0);
        let record = analysis_with(|r| r.predictions.drop_probability = 0.9);

        scene.advance(1.0 / 60.0, &FeatureChunk::neutral(0.0), Some(&record));
        assert!(scene.camera().fov_degrees > base);
    }

    #[test]
    fn test_neutral_input_keeps_base_fov() {
        let params = SceneParams::default();
        let base = params.camera.base_fov_degrees;
        let mut scene = SceneResponseController::new(params, 20_000.0);
        for _ in 0..120 {
            scene.advance(1.0 / 60.0, &FeatureChunk::neutral(0.0), None);
        }
        assert!((scene.camera().fov_degrees - base).abs() < 1e-4);
    }

    #[test]
    fn test_buildup_lifts_camera() {
        let mut calm = SceneResponseController::new(SceneParams::default(), 20_000.0);
        let mut building = SceneResponseController::new(SceneParams::default(), 20_000.0);
        let record = analysis_with(|r| r.predictions.buildup_probability = 1.0);
        let chunk = FeatureChunk::neutral(0.0);
        for _ in 0..30 {
            calm.advance(1.0 / 60.0, &chunk, None);
            building.advance(1.0 / 60.0, &chunk, Some(&record));
        }
        assert!(building.camera().position.y > calm.camera().position.y);
    }

    #[test]
    fn test_break_dims_light() {
        let mut steady = SceneResponseController::new(SceneParams::default(), 20_000.0);
        let mut breaking = SceneResponseController::new(SceneParams::default(), 20_000.0);
        let record = analysis_with(|r| r.predictions.break_probability = 1.0);
        let mut chunk = FeatureChunk::neutral(0.0);
        chunk.amplitude = 0.8;
        for _ in 0..30 {
            steady.advance(1.0 / 60.0, &chunk, None);
            breaking.advance(1.0 / 60.0, &chunk, Some(&record));
        }
        assert!(breaking.light().intensity < steady.light().intensity);
    }

    #[test]
    fn test_look_at_tracks_energy_center() {
        let mut scene = SceneResponseController::new(SceneParams::default(), 20_000.0);
        let mut chunk = FeatureChunk::neutral(0.0);
        chunk.energy_center = 20_000.0;
        for _ in 0..600 {
            scene.advance(1.0 / 60.0, &chunk, None);
        }
        let camera = scene.camera();
        assert!(camera.look_at.y > 0.0);
        assert!((scene.light().height_m - band_height(19)).abs() < 1e-3);
    }
}
