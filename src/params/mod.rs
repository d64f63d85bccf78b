//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, Hz, etc.)
//! - Documented ranges and meanings
//! - JSON loading so tuning never needs a rebuild

mod mapping;
mod particles;
mod render;
mod scene;
mod timeline;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisualizerError};

// Re-export all types
pub use mapping::MappingParams;
pub use particles::{LayerProfile, ParticleConfig};
pub use render::{PlaybackRun, ViewportConfig};
pub use scene::{CameraRig, LightingParams, SceneParams};
pub use timeline::TimelineConfig;

/// Complete configuration for one visualization session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub timeline: TimelineConfig,
    pub particles: ParticleConfig,
    pub mapping: MappingParams,
    pub scene: SceneParams,
    pub viewport: ViewportConfig,
}

impl VisualizerConfig {
    /// Load configuration from a JSON file and validate it
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Validate configuration (positive cadences, sane layer table, etc.)
    pub fn validate(&self) -> Result<()> {
        let t = &self.timeline;
        if !(t.chunk_interval_s > 0.0) || !(t.analysis_interval_s > 0.0) {
            return Err(VisualizerError::InvalidConfig(format!(
                "timeline intervals must be > 0, got chunk {} / analysis {}",
                t.chunk_interval_s, t.analysis_interval_s
            )));
        }
        if t.feed_capacity == 0 {
            return Err(VisualizerError::InvalidConfig(
                "feed capacity must be > 0".to_string(),
            ));
        }

        let p = &self.particles;
        if p.total_count == 0 {
            return Err(VisualizerError::InvalidConfig(
                "particle count must be > 0".to_string(),
            ));
        }
        let share_sum: f32 = p.layers.iter().map(|l| l.share).sum();
        if (share_sum - 1.0).abs() > 1e-3 {
            return Err(VisualizerError::InvalidConfig(format!(
                "layer shares must sum to 1.0, got {}",
                share_sum
            )));
        }
        for layer in &p.layers {
            if layer.bands.0 > layer.bands.1 || layer.bands.1 >= crate::features::FREQUENCY_BANDS
            {
                return Err(VisualizerError::InvalidConfig(format!(
                    "layer band range {:?} outside 0..{}",
                    layer.bands,
                    crate::features::FREQUENCY_BANDS
                )));
            }
        }
        if p.bounds_half_extent_m.iter().any(|e| !(*e > 0.0)) {
            return Err(VisualizerError::InvalidConfig(format!(
                "bounds must be > 0, got {:?}",
                p.bounds_half_extent_m
            )));
        }
        if !(0.0..=1.0).contains(&p.bounce_damping) || !(0.0..=1.0).contains(&p.velocity_damping)
        {
            return Err(VisualizerError::InvalidConfig(
                "damping factors must lie in 0..=1".to_string(),
            ));
        }

        let fov = self.scene.camera.base_fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(VisualizerError::InvalidConfig(format!(
                "base field of view must be in (0, 180) degrees, got {}",
                fov
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = VisualizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeline.chunk_interval_s, 0.2);
        assert_eq!(config.timeline.analysis_interval_s, 1.0);
        assert_eq!(config.particles.total_count, 300);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = VisualizerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: VisualizerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: VisualizerConfig =
            serde_json::from_str(r#"{"particles": {"total_count": 90}}"#).unwrap();
        assert_eq!(parsed.particles.total_count, 90);
        assert_eq!(parsed.particles.velocity_damping, 0.98);
        assert_eq!(parsed.timeline, TimelineConfig::default());
    }

    #[test]
    fn test_rejects_bad_layer_shares() {
        let mut config = VisualizerConfig::default();
        config.particles.layers[2].share = 0.5;
        assert!(matches!(
            config.validate(),
            Err(VisualizerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = VisualizerConfig::default();
        config.timeline.chunk_interval_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = VisualizerConfig::load_from_file("/nonexistent/synchronice.json");
        assert!(matches!(result, Err(VisualizerError::Io(_))));
    }
}
