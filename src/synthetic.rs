//! Procedural feature stream for headless runs and tests.
//!
//! Produces the same message sequence a live analysis producer would: chunks
//! on the fine grid, analysis records on the coarse grid, with relationships
//! derived from a sliding window of recent chunks.

use std::collections::VecDeque;

use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::features::{
    AnalysisRecord, DetectedPattern, EnergyChange, EnergyDirection, FeatureChunk, Patterns,
    Predictions, Relationships, Transitions, Trends, FREQUENCY_BANDS, PITCH_CLASSES,
};
use crate::params::TimelineConfig;
use crate::timeline::GRID_EPSILON;
use crate::transport::{ProcessingState, ProcessingStatus, StreamMessage};

/// Chunks kept for relationship analysis (5 s at the default cadence)
const ANALYSIS_WINDOW: usize = 25;

/// Chunks needed before periodicities are looked for
const PATTERN_MIN_CHUNKS: usize = 16;

/// Bars between chord changes
const BARS_PER_CHORD: f64 = 4.0;

/// Seeded generator of a plausible feature stream
pub struct SyntheticStream {
    chunk_interval_s: f64,
    analysis_interval_s: f64,
    tempo_bpm: f32,
    rng: StdRng,
    field: Perlin,
    window: VecDeque<FeatureChunk>,
    next_chunk: u64,
    next_analysis: u64,
}

impl SyntheticStream {
    pub fn new(timeline: &TimelineConfig, tempo_bpm: f32, seed: u64) -> Self {
        Self {
            chunk_interval_s: timeline.chunk_interval_s,
            analysis_interval_s: timeline.analysis_interval_s,
            tempo_bpm: tempo_bpm.max(1.0),
            rng: StdRng::seed_from_u64(seed),
            field: Perlin::new(seed as u32),
            window: VecDeque::with_capacity(ANALYSIS_WINDOW),
            next_chunk: 0,
            next_analysis: 0,
        }
    }

    /// Next chunk on the fine grid
    pub fn next_chunk(&mut self) -> FeatureChunk {
        let t = self.next_chunk as f64 * self.chunk_interval_s;
        self.next_chunk += 1;

        let beat_s = 60.0 / self.tempo_bpm as f64;
        let next_onset = ((t / beat_s) - GRID_EPSILON).ceil() * beat_s;
        let is_percussive = next_onset < t + self.chunk_interval_s - GRID_EPSILON;

        // Slow swells and drops in overall energy
        let energy = (0.5 + 0.6 * self.field.get([t * 0.08, 0.5, 0.25]) as f32).clamp(0.0, 1.0);

        let mut frequencies = [0.0; FREQUENCY_BANDS];
        for (band, value) in frequencies.iter_mut().enumerate() {
            let tilt = (-(band as f32) / 9.0).exp();
            let wobble = self.field.get([band as f64 * 0.37 + 0.5, t * 0.6, 3.3]) as f32;
            let kick = if is_percussive && band < 4 { 0.3 } else { 0.0 };
            *value = (energy * tilt * (1.0 + 0.5 * wobble) + kick).clamp(0.0, 1.0);
        }

        let total: f32 = frequencies.iter().sum();
        let brightness = if total > 0.0 {
            frequencies
                .iter()
                .enumerate()
                .map(|(b, v)| b as f32 * v)
                .sum::<f32>()
                / total
                / (FREQUENCY_BANDS - 1) as f32
        } else {
            0.0
        };
        let energy_center = 20.0 * 1000f32.powf(brightness);

        let swing = if is_percussive { 1.0 } else { 0.75 };
        let amplitude = (energy * swing + self.rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
        let beat_strength = if is_percussive {
            (0.5 + 0.5 * energy) * self.rng.gen_range(0.8..1.0)
        } else {
            0.1 * energy
        };

        let flatness =
            (0.35 + 0.25 * self.field.get([t * 0.3, 7.7, 1.9]) as f32).clamp(0.0, 1.0);

        // Triad on a root walking round the circle of fifths
        let chord = (t / (beat_s * 4.0 * BARS_PER_CHORD)).floor() as usize;
        let root = (chord * 7) % PITCH_CLASSES;
        let mut chroma_features = [0.0; PITCH_CLASSES];
        for value in chroma_features.iter_mut() {
            *value = self.rng.gen_range(0.0..0.2);
        }
        chroma_features[root] = 1.0;
        chroma_features[(root + 4) % PITCH_CLASSES] = 0.55;
        chroma_features[(root + 7) % PITCH_CLASSES] = 0.7;

        let chunk = FeatureChunk {
            timestamp: t,
            frequencies,
            amplitude,
            brightness,
            energy_center,
            is_percussive,
            rolloff: (energy_center * 1.6).min(22_050.0),
            zero_crossing_rate: brightness * 0.3,
            spectral_flatness: flatness,
            chroma_features,
            beat_strength,
            tempo: self.tempo_bpm,
        };

        if self.window.len() == ANALYSIS_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(chunk.clone());
        chunk
    }

    /// Analysis record due within the chunk just generated, if any
    fn analysis_for(&mut self, chunk: &FeatureChunk) -> Option<AnalysisRecord> {
        let nominal = self.next_analysis as f64 * self.analysis_interval_s;
        if nominal >= chunk.timestamp + self.chunk_interval_s - GRID_EPSILON {
            return None;
        }
        self.next_analysis += 1;
        let window: Vec<FeatureChunk> = self.window.iter().cloned().collect();
        Some(AnalysisRecord {
            chunk: FeatureChunk {
                timestamp: nominal,
                ..chunk.clone()
            },
            relationships: derive_relationships(&window),
        })
    }

    /// Every message for the first `duration_s` of media, in arrival order
    pub fn messages(&mut self, duration_s: f64) -> Vec<StreamMessage> {
        let total_chunks =
            (duration_s / self.chunk_interval_s - GRID_EPSILON).ceil().max(0.0) as u32;
        let status = |state, processed: u32| ProcessingStatus {
            status: state,
            progress: if total_chunks == 0 {
                1.0
            } else {
                processed as f32 / total_chunks as f32
            },
            total_chunks,
            processed_chunks: processed,
            duration: duration_s,
        };

        let mut messages = vec![StreamMessage::Status(status(ProcessingState::Processing, 0))];
        for processed in 1..=total_chunks {
            let chunk = self.next_chunk();
            let analysis = self.analysis_for(&chunk);
            messages.push(StreamMessage::ChunkData(chunk));
            if let Some(record) = analysis {
                messages.push(StreamMessage::AnalysisData(record));
            }
            if processed % 10 == 0 {
                messages.push(StreamMessage::Status(status(
                    ProcessingState::Processing,
                    processed,
                )));
            }
        }
        messages.push(StreamMessage::Status(status(
            ProcessingState::Completed,
            total_chunks,
        )));
        messages
    }
}

/// Least-squares line through `values` at x = 0, 1, 2, ...
///
/// Returns slope, intercept and correlation coefficient.
fn linear_fit(values: &[f32]) -> (f32, f32, f32) {
    let n = values.len() as f32;
    if values.len() < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0), 0.0);
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f32>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f32 - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let slope = sxy / sxx;
    let r = if syy > 0.0 { sxy / (sxx * syy).sqrt() } else { 0.0 };
    (slope, mean_y - slope * mean_x, r)
}

/// Slope scaled by window length over value range, in -1..1
fn normalized_trend(values: &[f32]) -> f32 {
    let max = values.iter().copied().fold(f32::MIN, f32::max);
    let min = values.iter().copied().fold(f32::MAX, f32::min);
    let range = max - min;
    if values.len() < 2 || !(range > 0.0) {
        return 0.0;
    }
    let (slope, _, _) = linear_fit(values);
    (slope * values.len() as f32 / range).clamp(-1.0, 1.0)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// One feature across a window of chunks
fn series(window: &[FeatureChunk], feature: impl Fn(&FeatureChunk) -> f32) -> Vec<f32> {
    window.iter().map(feature).collect()
}

fn variance(values: &[f32]) -> f32 {
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
}

/// Trends, transitions and predictions over a window of recent chunks
///
/// Windows shorter than two chunks give the neutral relationships.
pub fn derive_relationships(window: &[FeatureChunk]) -> Relationships {
    if window.len() < 2 {
        return Relationships::default();
    }
    let amplitudes = series(window, |c| c.amplitude);
    let energy = series(window, |c| (c.amplitude + c.brightness + c.beat_strength) / 3.0);
    let overall = normalized_trend(&energy);

    let current = &window[window.len() - 1];
    let previous = &window[window.len() - 2];
    let changes: Vec<f32> = amplitudes.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let accelerations: Vec<f32> = amplitudes
        .windows(3)
        .map(|w| ((w[2] - w[1]) - (w[1] - w[0])).abs())
        .collect();
    let rise = amplitudes[amplitudes.len() - 1] - amplitudes[0];

    let transitions = Transitions {
        amplitude_delta: current.amplitude - previous.amplitude,
        brightness_delta: current.brightness - previous.brightness,
        beat_strength_delta: current.beat_strength - previous.beat_strength,
        frequency_deltas: current
            .frequencies
            .iter()
            .zip(previous.frequencies.iter())
            .map(|(c, p)| c - p)
            .collect(),
        transition_smoothness: (1.0 / (1.0 + variance(&changes) * 10.0)).clamp(0.0, 1.0),
        change_velocity: mean(&accelerations),
        energy_direction: if rise > 0.05 {
            EnergyDirection::Increasing
        } else if rise < -0.05 {
            EnergyDirection::Decreasing
        } else {
            EnergyDirection::Stable
        },
    };

    let trends = Trends {
        amplitude_trend: normalized_trend(&amplitudes),
        brightness_trend: normalized_trend(&series(window, |c| c.brightness)),
        beat_strength_trend: normalized_trend(&series(window, |c| c.beat_strength)),
        frequency_trends: (0..FREQUENCY_BANDS)
            .map(|b| normalized_trend(&series(window, |c| c.frequencies[b])))
            .collect(),
        overall_energy_trend: overall,
        trend_strength: if window.len() >= 3 {
            linear_fit(&amplitudes).2.abs()
        } else {
            0.0
        },
        volatility: variance(&amplitudes).sqrt(),
    };

    let predictions = if window.len() < 3 {
        Predictions::default()
    } else {
        predict(window, &amplitudes, overall)
    };

    Relationships {
        transitions,
        trends,
        patterns: detect_patterns(window),
        predictions,
    }
}

/// Rhythmic periodicity from the spacing of amplitude peaks
///
/// Peaks are local maxima at or above the window mean. Three or more give
/// one rhythmic pattern whose period is the mean peak spacing; it counts as
/// regular (strength 1) when the spacing varies by less than one chunk.
fn detect_patterns(window: &[FeatureChunk]) -> Patterns {
    if window.len() < PATTERN_MIN_CHUNKS {
        return Patterns::default();
    }
    let interval_s = (window[window.len() - 1].timestamp - window[0].timestamp)
        / (window.len() - 1) as f64;
    if !(interval_s > 0.0) {
        return Patterns::default();
    }

    let amplitudes = series(window, |c| c.amplitude);
    let floor = mean(&amplitudes);
    let peaks: Vec<usize> = (1..amplitudes.len() - 1)
        .filter(|&i| {
            let a = amplitudes[i];
            a >= floor && a > amplitudes[i - 1] && a >= amplitudes[i + 1]
        })
        .collect();
    if peaks.len() < 3 {
        return Patterns::default();
    }

    let spacing: Vec<f32> = peaks.windows(2).map(|w| (w[1] - w[0]) as f32).collect();
    let mean_spacing = mean(&spacing);
    let strength = if variance(&spacing).sqrt() < 1.0 { 1.0 } else { 0.0 };
    let pattern = DetectedPattern {
        kind: "rhythmic".to_string(),
        period_s: mean_spacing * interval_s as f32,
        strength,
        last_occurrence_s: window[peaks[peaks.len() - 1]].timestamp as f32,
    };

    // One pattern kind, so confidence saturates at a third
    Patterns {
        pattern_strength: strength,
        cycle_length: Some(mean_spacing as u32),
        pattern_confidence: (strength / 3.0).clamp(0.0, 1.0),
        detected_patterns: vec![pattern],
    }
}

fn predict(window: &[FeatureChunk], amplitudes: &[f32], overall: f32) -> Predictions {
    let extrapolate = |values: &[f32]| {
        let (slope, intercept, _) = linear_fit(values);
        (slope * values.len() as f32 + intercept).clamp(0.0, 1.0)
    };
    let brightness: Vec<f32> = window.iter().map(|c| c.brightness).collect();
    let beats: Vec<f32> = window.iter().map(|c| c.beat_strength).collect();
    let current = amplitudes[amplitudes.len() - 1];

    let predicted_energy_change = if window.len() < 5 {
        EnergyChange::Stable
    } else {
        let recent: Vec<f32> = window[window.len() - 5..]
            .iter()
            .map(|c| (c.amplitude + c.brightness + c.beat_strength) / 3.0)
            .collect();
        let recent_trend = normalized_trend(&recent);
        if recent_trend > 0.3 && current > 0.7 {
            EnergyChange::Drop
        } else if recent_trend > 0.1 {
            EnergyChange::Buildup
        } else if recent_trend < -0.2 {
            EnergyChange::Breakdown
        } else {
            EnergyChange::Stable
        }
    };

    let drop_probability = if window.len() < 5 {
        0.0
    } else {
        let tail = window.len() - 3;
        let mut p = 0.0;
        if mean(&amplitudes[tail..]) > 0.7 {
            p += 0.3;
        }
        if mean(&beats[tail..]) > 0.6 {
            p += 0.3;
        }
        if overall > 0.2 {
            p += 0.4;
        }
        f32::min(p, 1.0)
    };

    Predictions {
        predicted_amplitude: extrapolate(amplitudes),
        predicted_brightness: extrapolate(&brightness),
        predicted_beat_strength: extrapolate(&beats),
        predicted_energy_change,
        drop_probability,
        buildup_probability: overall.clamp(0.0, 1.0),
        break_probability: if current < 0.3 && overall < -0.1 {
            overall.abs().min(1.0)
        } else {
            0.0
        },
    }
}
