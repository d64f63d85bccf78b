//! Derived relationships carried by coarse analysis records.
//!
//! Every block defaults to the neutral "not enough history yet" values the
//! producer emits at the start of a stream, so partially populated records
//! still decode.

use serde::{Deserialize, Serialize};

/// Direction of the recent energy change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

/// Kind of energy change expected in the next window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyChange {
    Drop,
    Buildup,
    Breakdown,
    #[default]
    Stable,
}

/// Deltas since the previous window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transitions {
    pub amplitude_delta: f32,
    pub brightness_delta: f32,
    pub beat_strength_delta: f32,
    pub frequency_deltas: Vec<f32>,
    /// 1.0 = perfectly smooth amplitude changes
    pub transition_smoothness: f32,
    /// Mean absolute amplitude acceleration
    pub change_velocity: f32,
    pub energy_direction: EnergyDirection,
}

impl Default for Transitions {
    fn default() -> Self {
        Self {
            amplitude_delta: 0.0,
            brightness_delta: 0.0,
            beat_strength_delta: 0.0,
            frequency_deltas: Vec::new(),
            transition_smoothness: 1.0,
            change_velocity: 0.0,
            energy_direction: EnergyDirection::Stable,
        }
    }
}

/// Short-horizon slopes, each normalized to -1..1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trends {
    pub amplitude_trend: f32,
    pub brightness_trend: f32,
    pub beat_strength_trend: f32,
    pub frequency_trends: Vec<f32>,
    /// Combined amplitude/brightness/beat slope (-1 falling, 1 rising)
    pub overall_energy_trend: f32,
    /// |r| of the amplitude regression
    pub trend_strength: f32,
    /// Standard deviation of amplitude over the window
    pub volatility: f32,
}

/// One detected periodicity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "period")]
    pub period_s: f32,
    pub strength: f32,
    #[serde(rename = "last_occurrence")]
    pub last_occurrence_s: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patterns {
    pub detected_patterns: Vec<DetectedPattern>,
    pub pattern_strength: f32,
    /// Dominant cycle length in chunks
    pub cycle_length: Option<u32>,
    pub pattern_confidence: f32,
}

/// Event probabilities and next-window extrapolations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Predictions {
    pub predicted_amplitude: f32,
    pub predicted_brightness: f32,
    pub predicted_beat_strength: f32,
    pub predicted_energy_change: EnergyChange,
    pub drop_probability: f32,
    pub buildup_probability: f32,
    pub break_probability: f32,
}

impl Default for Predictions {
    fn default() -> Self {
        Self {
            predicted_amplitude: 0.5,
            predicted_brightness: 0.5,
            predicted_beat_strength: 0.5,
            predicted_energy_change: EnergyChange::Stable,
            drop_probability: 0.0,
            buildup_probability: 0.0,
            break_probability: 0.0,
        }
    }
}

/// All relationship blocks for one analysis window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationships {
    pub transitions: Transitions,
    pub trends: Trends,
    pub patterns: Patterns,
    pub predictions: Predictions,
}

impl Relationships {
    /// Trend and prediction fields that feed the scene response, clamped
    pub fn overall_energy_trend(&self) -> f32 {
        sanitize(self.trends.overall_energy_trend, -1.0, 1.0)
    }

    pub fn drop_probability(&self) -> f32 {
        sanitize(self.predictions.drop_probability, 0.0, 1.0)
    }

    pub fn buildup_probability(&self) -> f32 {
        sanitize(self.predictions.buildup_probability, 0.0, 1.0)
    }

    pub fn break_probability(&self) -> f32 {
        sanitize(self.predictions.break_probability, 0.0, 1.0)
    }
}

fn sanitize(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_decodes_to_neutral() {
        let rel: Relationships = serde_json::from_str("{}").unwrap();
        assert_eq!(rel, Relationships::default());
        assert_eq!(rel.transitions.transition_smoothness, 1.0);
        assert_eq!(rel.predictions.predicted_amplitude, 0.5);
        assert_eq!(rel.transitions.energy_direction, EnergyDirection::Stable);
    }

    #[test]
    fn test_pattern_wire_names() {
        let json = r#"{"patterns": {"detected_patterns": [
            {"type": "rhythmic", "period": 0.8, "strength": 1.0, "last_occurrence": 7.6}
        ], "cycle_length": 4}}"#;
        let rel: Relationships = serde_json::from_str(json).unwrap();
        let pattern = &rel.patterns.detected_patterns[0];
        assert_eq!(pattern.kind, "rhythmic");
        assert_eq!(pattern.period_s, 0.8);
        assert_eq!(rel.patterns.cycle_length, Some(4));
    }

    #[test]
    fn test_probabilities_are_clamped() {
        let mut rel = Relationships::default();
        rel.predictions.drop_probability = 1.7;
        rel.trends.overall_energy_trend = f32::NAN;
        assert_eq!(rel.drop_probability(), 1.0);
        assert_eq!(rel.overall_energy_trend(), 0.0);
    }

    #[test]
    fn test_energy_change_snake_case() {
        let change: EnergyChange = serde_json::from_str("\"breakdown\"").unwrap();
        assert_eq!(change, EnergyChange::Breakdown);
    }
}
