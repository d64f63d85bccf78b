//! Per-frame particle update: targets, easing, forces, integration, bounds.

use std::f32::consts::TAU;

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::layer::{partition, Layer};
use super::{Particle, ParticleInstance};
use crate::features::{FeatureChunk, FREQUENCY_BANDS, NEUTRAL_TEMPO_BPM};
use crate::mapping::{Hsl, MappedFrame, ParticleSlot, SynestheticMapper};
use crate::params::ParticleConfig;

/// Scale wobble from the beat pulse (fraction of size)
const PULSE_DEPTH: f32 = 0.12;

/// Tempo accepted by the integrator (BPM)
const TEMPO_RANGE_BPM: (f32, f32) = (0.0, 300.0);

/// Fixed set of particles in three layers
pub struct ParticleSystem {
    particles: Vec<Particle>,
    config: ParticleConfig,
    layer_counts: [usize; 3],
    rng: StdRng,
    jitter_field: Perlin,
    elapsed_s: f64,
}

impl ParticleSystem {
    /// Create the full particle set for a session
    ///
    /// Spawn positions, pulse phases and angle jitter come from the
    /// configured seed, so two systems with the same config are identical.
    pub fn new(config: &ParticleConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let layer_counts = partition(config.total_count, &config.layers);
        let half = Vec3::from_array(config.bounds_half_extent_m);

        let mut particles = Vec::with_capacity(config.total_count);
        for layer in Layer::ALL {
            let profile = &config.layers[layer.index()];
            let (low, _) = profile.bands;
            for i in 0..layer_counts[layer.index()] {
                let spawn = Vec3::new(
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                ) * half;
                let resting = Hsl::new(0.0, 0.3, 0.4);
                particles.push(Particle {
                    id: particles.len() as u32,
                    layer,
                    frequency_band: (low + i % profile.band_span()).min(FREQUENCY_BANDS - 1),
                    position: spawn,
                    velocity: Vec3::ZERO,
                    target_position: spawn,
                    base_size: profile.base_size,
                    current_size: profile.base_size,
                    target_size: profile.base_size,
                    color: resting,
                    target_color: resting,
                    opacity: 0.0,
                    target_opacity: profile.base_opacity,
                    pulse_phase: rng.gen_range(0.0..1.0),
                    harmonic_resonance: 0.0,
                    angle_jitter: rng.gen_range(-0.5..0.5),
                });
            }
        }

        log::debug!(
            "[Particles] Spawned {} particles ({}/{}/{})",
            particles.len(),
            layer_counts[0],
            layer_counts[1],
            layer_counts[2]
        );

        Self {
            particles,
            config: config.clone(),
            layer_counts,
            jitter_field: Perlin::new(config.seed as u32),
            rng,
            elapsed_s: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particle count per layer: foundation, harmony, atmosphere
    pub fn layer_counts(&self) -> [usize; 3] {
        self.layer_counts
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Advance every particle by one frame
    ///
    /// `frame` must be `mapper.map_frame(chunk)`; it is passed in so the
    /// frame-wide mapping is computed once per tick.
    ///
    /// # Arguments
    /// * `dt_s` - Frame delta in seconds (clamped; zero while paused)
    /// * `chunk` - Interpolated feature vector for this frame
    /// * `frame` - Frame-wide mapping of `chunk`
    /// * `mapper` - Mapper producing per-particle targets
    pub fn advance(
        &mut self,
        dt_s: f32,
        chunk: &FeatureChunk,
        frame: &MappedFrame,
        mapper: &SynestheticMapper,
    ) {
        let dt = if dt_s.is_finite() {
            dt_s.clamp(0.0, self.config.max_frame_dt_s)
        } else {
            0.0
        };
        let ease = (dt * self.config.easing_rate_per_s).min(1.0);

        let tempo = chunk.tempo.clamp(TEMPO_RANGE_BPM.0, TEMPO_RANGE_BPM.1);
        let tempo_multiplier = 0.5 + (tempo / NEUTRAL_TEMPO_BPM) * 0.5;
        let amplitude = chunk.amplitude.clamp(0.0, 1.0);
        let impulse_chance = chunk.beat_strength.clamp(0.0, 1.0) * 0.3;
        let top_band = (FREQUENCY_BANDS - 1) as f32;

        let half = Vec3::from_array(self.config.bounds_half_extent_m);
        let total = self.particles.len();
        let noise_t = self.elapsed_s * self.config.jitter_frequency_hz as f64;

        for (index, p) in self.particles.iter_mut().enumerate() {
            let profile = &self.config.layers[p.layer.index()];

            // 1. Targets
            let slot = ParticleSlot {
                index,
                total,
                band: p.frequency_band,
                angle_jitter: p.angle_jitter,
            };
            let targets = mapper.map_particle(frame, chunk, &slot, profile);
            p.target_position = targets.position;
            p.target_size = targets.size;
            p.target_color = targets.color;
            p.target_opacity = targets.opacity;
            p.harmonic_resonance = targets.harmonic_resonance;

            // 2. Easing
            p.current_size += (p.target_size - p.current_size) * ease;
            p.color = p.color.ease_toward(p.target_color, ease);
            p.opacity += (p.target_opacity - p.opacity) * ease;

            // 3. Forces
            let band_energy = chunk.band(p.frequency_band).clamp(0.0, 1.0);
            let lift = (0.5 - p.frequency_band as f32 / top_band) * 2.0 * band_energy;
            let mut accel = Vec3::Y * lift * self.config.band_lift;
            accel += (p.target_position - p.position) * self.config.anchor_attraction;
            accel += jitter(&self.jitter_field, p.id, noise_t) * self.config.jitter_strength;
            p.velocity += accel * profile.mobility * dt;

            if dt > 0.0 && chunk.is_percussive && self.rng.gen::<f32>() < impulse_chance {
                p.velocity += random_direction(&mut self.rng)
                    * self.config.percussive_impulse_m_per_s
                    * profile.mobility;
            }

            // 4. Integration
            p.position += p.velocity * dt * tempo_multiplier * (1.0 + amplitude);

            // 5. Bounds
            if !p.position.is_finite() || !p.velocity.is_finite() {
                p.position = p.target_position.clamp(-half, half);
                p.velocity = Vec3::ZERO;
            }
            reflect(&mut p.position, &mut p.velocity, half, self.config.bounce_damping);

            // 6. Damping
            p.velocity *= self.config.velocity_damping;

            // 7. Pulse
            p.pulse_phase = (p.pulse_phase + dt * tempo / 60.0).rem_euclid(1.0);
        }

        self.elapsed_s += dt as f64;
    }

    /// Render-ready instance data, indexed by particle id
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles
            .iter()
            .map(|p| {
                let [r, g, b] = p.color.to_rgb();
                ParticleInstance {
                    position: p.position.to_array(),
                    scale: p.current_size * (1.0 + PULSE_DEPTH * (p.pulse_phase * TAU).sin()),
                    color_rgba: [r, g, b, p.opacity.clamp(0.0, 1.0)],
                    id: p.id,
                }
            })
            .collect()
    }
}

/// Smooth per-particle drift from a 3D Perlin field
fn jitter(field: &Perlin, id: u32, t: f64) -> Vec3 {
    // Offsets keep samples off the integer lattice, where Perlin is zero
    let seed = id as f64 * 1.618 + 0.37;
    Vec3::new(
        field.get([seed, t, 0.11]) as f32,
        field.get([seed, t, 17.43]) as f32,
        field.get([seed, t, 34.77]) as f32,
    )
}

fn random_direction(rng: &mut StdRng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let y: f32 = rng.gen_range(-1.0..1.0);
    let r = (1.0 - y * y).sqrt();
    Vec3::new(r * theta.cos(), y, r * theta.sin())
}

/// Clamp to the box and bounce the offending velocity component
fn reflect(position: &mut Vec3, velocity: &mut Vec3, half: Vec3, damping: f32) {
    for axis in 0..3 {
        let bound = half[axis];
        if position[axis] > bound {
            position[axis] = bound;
            if velocity[axis] > 0.0 {
                velocity[axis] = -velocity[axis] * damping;
            }
        } else if position[axis] < -bound {
            position[axis] = -bound;
            if velocity[axis] < 0.0 {
                velocity[axis] = -velocity[axis] * damping;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::chunk;

    fn step(system: &mut ParticleSystem, mapper: &SynestheticMapper, c: &FeatureChunk, dt: f32) {
        let frame = mapper.map_frame(c);
        system.advance(dt, c, &frame, mapper);
    }

    #[test]
    fn test_default_layer_partition() {
        let system = ParticleSystem::new(&ParticleConfig::default());
        assert_eq!(system.len(), 300);
        assert_eq!(system.layer_counts(), [120, 120, 60]);

        let harmony = system
            .particles()
            .iter()
            .filter(|p| p.layer == Layer::Harmony)
            .count();
        assert_eq!(harmony, 120);
    }

    #[test]
    fn test_bands_stay_in_layer_range() {
        let config = ParticleConfig::default();
        let system = ParticleSystem::new(&config);
        for p in system.particles() {
            let (low, high) = config.layers[p.layer.index()].bands;
            assert!(p.frequency_band >= low && p.frequency_band <= high);
        }
    }

    #[test]
    fn test_ids_match_indices() {
        let system = ParticleSystem::new(&ParticleConfig::default());
        for (i, p) in system.particles().iter().enumerate() {
            assert_eq!(p.id as usize, i);
        }
        for (i, inst) in system.instances().iter().enumerate() {
            assert_eq!(inst.id as usize, i);
        }
    }

    #[test]
    fn test_count_invariant_across_frames() {
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&ParticleConfig::default());
        for k in 0..200 {
            let c = chunk(k as f64 * 0.2, (k % 7) as f32 / 7.0);
            step(&mut system, &mapper, &c, 1.0 / 60.0);
        }
        assert_eq!(system.len(), 300);
        assert_eq!(system.instances().len(), 300);
    }

    #[test]
    fn test_positions_never_leave_bounds() {
        let config = ParticleConfig {
            percussive_impulse_m_per_s: 400.0,
            anchor_attraction: 50.0,
            band_lift: 80.0,
            ..ParticleConfig::default()
        };
        let half = config.bounds_half_extent_m;
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&config);
        let mut rng = StdRng::seed_from_u64(7);

        for k in 0..300 {
            let mut c = chunk(k as f64 * 0.2, rng.gen_range(0.0..1.0));
            c.is_percussive = true;
            c.beat_strength = 1.0;
            c.tempo = rng.gen_range(0.0..400.0);
            c.energy_center = rng.gen_range(0.0..40_000.0);
            step(&mut system, &mapper, &c, rng.gen_range(0.0..0.5));

            for p in system.particles() {
                for axis in 0..3 {
                    assert!(
                        p.position[axis].abs() <= half[axis],
                        "particle {} axis {} at {}",
                        p.id,
                        axis,
                        p.position[axis]
                    );
                }
            }
        }
    }

    #[test]
    fn test_neutral_input_eases_toward_neutral_targets() {
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&ParticleConfig::default());
        let neutral = FeatureChunk::neutral(0.0);
        for _ in 0..600 {
            step(&mut system, &mapper, &neutral, 1.0 / 60.0);
        }
        for p in system.particles() {
            assert!((p.current_size - p.base_size).abs() < 1e-3);
            assert!((p.opacity - p.target_opacity).abs() < 1e-3);
            assert!(p.position.is_finite());
        }
    }

    #[test]
    fn test_bad_dt_is_harmless() {
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&ParticleConfig::default());
        let before: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();
        let c = chunk(0.0, 1.0);

        step(&mut system, &mapper, &c, f32::NAN);
        step(&mut system, &mapper, &c, -1.0);
        let after: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);

        step(&mut system, &mapper, &c, 1000.0);
        assert!(system.particles().iter().all(|p| p.position.is_finite()));
    }

    #[test]
    fn test_paused_percussive_frames_build_no_velocity() {
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&ParticleConfig::default());
        let before: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();
        let mut c = chunk(0.0, 1.0);
        c.is_percussive = true;
        c.beat_strength = 1.0;

        for _ in 0..120 {
            step(&mut system, &mapper, &c, 0.0);
        }

        assert!(system.particles().iter().all(|p| p.velocity == Vec3::ZERO));
        let after: Vec<Vec3> = system.particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_easing_is_frame_rate_independent_at_saturation() {
        let mapper = SynestheticMapper::default();
        let config = ParticleConfig {
            easing_rate_per_s: 100.0,
            ..ParticleConfig::default()
        };
        let mut system = ParticleSystem::new(&config);
        let loud = chunk(0.0, 1.0);
        step(&mut system, &mapper, &loud, 0.05);
        for p in system.particles() {
            assert!((p.current_size - p.target_size).abs() < 1e-6);
            assert!((p.opacity - p.target_opacity).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pulse_phase_follows_tempo() {
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&ParticleConfig::default());
        let start: Vec<f32> = system.particles().iter().map(|p| p.pulse_phase).collect();

        // 120 BPM for 0.05 s is a tenth of a beat
        let c = FeatureChunk::neutral(0.0);
        step(&mut system, &mapper, &c, 0.05);
        for (p, s) in system.particles().iter().zip(start) {
            let drift = (p.pulse_phase - s - 0.1).rem_euclid(1.0);
            assert!(drift.min(1.0 - drift) < 1e-5);
            assert!(p.pulse_phase >= 0.0 && p.pulse_phase < 1.0);
        }
    }

    #[test]
    fn test_same_seed_same_simulation() {
        let mapper = SynestheticMapper::default();
        let mut a = ParticleSystem::new(&ParticleConfig::default());
        let mut b = ParticleSystem::new(&ParticleConfig::default());
        let mut c = chunk(0.0, 0.8);
        c.is_percussive = true;
        c.beat_strength = 0.9;
        for _ in 0..30 {
            step(&mut a, &mapper, &c, 1.0 / 60.0);
            step(&mut b, &mapper, &c, 1.0 / 60.0);
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_low_bands_rise_high_bands_sink() {
        let config = ParticleConfig {
            anchor_attraction: 0.0,
            jitter_strength: 0.0,
            ..ParticleConfig::default()
        };
        let mapper = SynestheticMapper::default();
        let mut system = ParticleSystem::new(&config);
        step(&mut system, &mapper, &chunk(0.0, 1.0), 0.05);

        for p in system.particles() {
            if p.frequency_band == 0 {
                assert!(p.velocity.y > 0.0);
            } else if p.frequency_band == FREQUENCY_BANDS - 1 {
                assert!(p.velocity.y < 0.0);
            }
        }
    }
}
